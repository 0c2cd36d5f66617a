//! Whole-run configuration.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::clock::ClockConfig;
use crate::error::SimError;
use crate::radio::RadioConfig;
use crate::sync::{ProtocolKind, SyncConfig};
use crate::topology::Layout;

/// Scenario parameters for one run.
///
/// | Field             | Unit    | Description                                 | Default        |
/// |-------------------|---------|---------------------------------------------|----------------|
/// | seed              | -       | Seed of the shared random source            | 0              |
/// | ticks_per_second  | ticks   | Scheduler ticks in one simulated second     | 1_000_000      |
/// | duration_secs     | seconds | Horizon of `Simulation::run`                | 3600           |
/// | log_interval_secs | seconds | Status line interval used by the runner     | 20             |
/// | node_count        | -       | Nodes placed by the runner                  | 20             |
/// | protocol          | -       | Strategy of every node                      | ftsp           |
/// | layout / spacing  | -       | Placement of the nodes                      | line / 10      |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "RunConfig::default_ticks_per_second")]
    pub ticks_per_second: u64,
    #[serde(default = "RunConfig::default_duration_secs")]
    pub duration_secs: u64,
    #[serde(default = "RunConfig::default_log_interval_secs")]
    pub log_interval_secs: u64,
    #[serde(default = "RunConfig::default_node_count")]
    pub node_count: usize,
    #[serde(default = "RunConfig::default_protocol")]
    pub protocol: ProtocolKind,
    #[serde(default = "RunConfig::default_layout")]
    pub layout: Layout,
    #[serde(default = "RunConfig::default_spacing")]
    pub spacing: f64,
    /// CSV file receiving one status record per node per log interval
    #[serde(default = "RunConfig::default_output_filepath")]
    pub output_filepath: String,
    #[serde(default = "RunConfig::default_summary_filepath")]
    pub summary_filepath: String,
}

impl RunConfig {
    /// Horizon in scheduler ticks.
    pub fn duration_ticks(&self) -> u64 {
        self.duration_secs.saturating_mul(self.ticks_per_second)
    }

    pub fn log_interval_ticks(&self) -> u64 {
        self.log_interval_secs.saturating_mul(self.ticks_per_second)
    }

    fn default_ticks_per_second() -> u64 {
        1_000_000
    }
    fn default_duration_secs() -> u64 {
        3_600
    }
    fn default_log_interval_secs() -> u64 {
        20
    }
    fn default_node_count() -> usize {
        20
    }
    fn default_protocol() -> ProtocolKind {
        ProtocolKind::Ftsp
    }
    fn default_layout() -> Layout {
        Layout::Line
    }
    fn default_spacing() -> f64 {
        10.0
    }
    fn default_output_filepath() -> String {
        "wsnsim-status.csv".to_string()
    }
    fn default_summary_filepath() -> String {
        "wsnsim-summary.json".to_string()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            ticks_per_second: Self::default_ticks_per_second(),
            duration_secs: Self::default_duration_secs(),
            log_interval_secs: Self::default_log_interval_secs(),
            node_count: Self::default_node_count(),
            protocol: Self::default_protocol(),
            layout: Self::default_layout(),
            spacing: Self::default_spacing(),
            output_filepath: Self::default_output_filepath(),
            summary_filepath: Self::default_summary_filepath(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub simulation: RunConfig,
}

impl SimConfig {
    /// Load config from the file path in `CONFIG_FILE` env var.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_FILE")
            .map_err(|_| ConfigError::Message("CONFIG_FILE environment variable not set".into()))?;
        Self::from_file(&path)
    }

    /// Load config from a TOML file. Environment variables such as
    /// `WSNSIM_SYNC__BEACON_PERIOD` or `WSNSIM_SIMULATION__SEED` override
    /// file values.
    pub fn from_file(config_file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(config_file))
            .add_source(
                Environment::with_prefix("WSNSIM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Rejects settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        self.clock
            .validate()
            .and_then(|_| self.radio.validate())
            .and_then(|_| self.sync.validate())
            .and_then(|_| self.validate_run())
            .map_err(SimError::InvalidConfig)
    }

    fn validate_run(&self) -> Result<(), String> {
        let run = &self.simulation;
        if run.ticks_per_second == 0 {
            return Err("ticks per second must be positive".into());
        }
        if run.log_interval_secs == 0 {
            return Err("log interval must be positive".into());
        }
        if !(run.spacing > 0.0) {
            return Err(format!("node spacing must be positive, got {}", run.spacing));
        }
        if run.node_count == 0 {
            return Err("at least one node is needed".into());
        }
        if let Some(root) = self.sync.forced_root {
            if root == 0 || root as usize > run.node_count {
                return Err(format!(
                    "forced root {root} is not among nodes 1..={}",
                    run.node_count
                ));
            }
        }
        Ok(())
    }
}
