pub mod clock;
pub mod error;
pub mod node;
pub mod radio;
pub mod register;
pub mod rng;
pub mod scheduler;
pub mod simulation;
pub mod sync;
pub mod topology;

pub use error::{SimError, SimResult};
pub use register::Register;
pub use simulation::{SimConfig, Simulation};
