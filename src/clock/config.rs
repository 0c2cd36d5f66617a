//! Hardware clock model parameters.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Drift and noise parameters for the simulated oscillators.
///
/// | Field                  | Unit          | Description                                   | Default |
/// |------------------------|---------------|-----------------------------------------------|---------|
/// | mean_drift_ppm         | ppm           | Mean of the per-clock drift draw              | 50      |
/// | drift_deviation_ppm    | ppm           | Spread of the per-clock drift draw            | 300     |
/// | noise_deviation        | 1e-8 fraction | Spread of the per-advance noise draw          | 5       |
///
/// Drift is drawn once per clock; noise is drawn on every advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "ClockConfig::default_mean_drift_ppm")]
    pub mean_drift_ppm: f64,
    #[serde(default = "ClockConfig::default_drift_deviation_ppm")]
    pub drift_deviation_ppm: f64,
    /// In units of 1e-8 (so the default 5 means 5e-8 per tick).
    #[serde(default = "ClockConfig::default_noise_deviation")]
    pub noise_deviation: f64,
}

impl ClockConfig {
    /// Load clock config from the file path in `CONFIG_FILE` env var.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_FILE")
            .map_err(|_| ConfigError::Message("CONFIG_FILE environment variable not set".into()))?;
        Self::from_file(&path)
    }

    /// Load clock config from a TOML file. Supports:
    /// - Files with a `[clock]` section (full simulation configs)
    /// - Flat files with the clock fields at root
    ///
    /// Either way, environment variables `WSNSIM_CLOCK__MEAN_DRIFT_PPM`,
    /// `WSNSIM_CLOCK__DRIFT_DEVIATION_PPM` and `WSNSIM_CLOCK__NOISE_DEVIATION`
    /// override file values, the same names `SimConfig::from_file` reads.
    pub fn from_file(config_file: &str) -> Result<Self, ConfigError> {
        let file = Config::builder()
            .add_source(File::with_name(config_file))
            .build()?;

        if file.get_table("clock").is_ok() {
            Config::builder()
                .add_source(File::with_name(config_file))
                .add_source(
                    Environment::with_prefix("WSNSIM")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()?
                .get("clock")
        } else {
            Config::builder()
                .add_source(File::with_name(config_file))
                .add_source(
                    Environment::with_prefix("WSNSIM_CLOCK")
                        .prefix_separator("__")
                        .try_parsing(true),
                )
                .build()?
                .try_deserialize()
        }
    }

    /// Clock parameters with drift and noise disabled.
    pub fn ideal() -> Self {
        Self {
            mean_drift_ppm: 0.0,
            drift_deviation_ppm: 0.0,
            noise_deviation: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.drift_deviation_ppm < 0.0 || self.noise_deviation < 0.0 {
            return Err("clock deviations must be non-negative".into());
        }
        if self.mean_drift_ppm.abs() >= 1_000_000.0 {
            return Err(format!(
                "mean drift of {} ppm would stop or reverse the clock",
                self.mean_drift_ppm
            ));
        }
        Ok(())
    }

    fn default_mean_drift_ppm() -> f64 {
        50.0
    }
    fn default_drift_deviation_ppm() -> f64 {
        300.0
    }
    fn default_noise_deviation() -> f64 {
        5.0
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mean_drift_ppm: Self::default_mean_drift_ppm(),
            drift_deviation_ppm: Self::default_drift_deviation_ppm(),
            noise_deviation: Self::default_noise_deviation(),
        }
    }
}
