//! Hardware clocks and the timers built on top of them.

pub mod config;
pub mod hardware;
pub mod timer;

pub use config::ClockConfig;
pub use hardware::Clock;
pub use timer::Timer;
