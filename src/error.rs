use thiserror::Error;

use crate::sync::NodeId;

/// Errors surfaced while configuring or driving a simulation.
///
/// Channel conditions (busy sender, collisions, corruption) are simulated
/// outcomes and never show up here.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Timer period must be positive, got {0}")]
    InvalidPeriod(u64),
    #[error("Node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Node {0} is already running")]
    AlreadyRunning(NodeId),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A type alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
