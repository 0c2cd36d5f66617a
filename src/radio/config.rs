//! Channel and MAC parameters.

use serde::{Deserialize, Serialize};

/// Propagation, reception and channel-access parameters.
///
/// | Field               | Unit             | Description                                   | Default |
/// |---------------------|------------------|-----------------------------------------------|---------|
/// | max_distance        | distance units   | Neighbor range                                | 10      |
/// | path_loss_exponent  | -                | `signal = intensity / distance^alpha`         | 2       |
/// | transmit_intensity  | -                | Transmit power of every radio                 | 100     |
/// | noise_variance      | -                | Ambient noise floor                           | 0.025   |
/// | max_allowed_noise   | x noise_variance | Channel considered busy above this            | 5       |
/// | receive_start_snr   | ratio            | SNR needed to lock onto a packet              | 4       |
/// | corruption_snr      | ratio            | SNR below which a reception is corrupted      | 2       |
/// | min_wait/random_wait| ticks            | Channel access delay before first sensing     | 5000/3200 |
/// | min_backoff/random_backoff | ticks     | Delay before re-sensing a busy channel        | 2500/750 |
/// | transmission_time   | ticks            | Air time of one packet                        | 960     |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioConfig {
    #[serde(default = "RadioConfig::default_max_distance")]
    pub max_distance: f64,
    #[serde(default = "RadioConfig::default_path_loss_exponent")]
    pub path_loss_exponent: f64,
    #[serde(default = "RadioConfig::default_transmit_intensity")]
    pub transmit_intensity: f64,
    #[serde(default = "RadioConfig::default_noise_variance")]
    pub noise_variance: f64,
    #[serde(default = "RadioConfig::default_max_allowed_noise")]
    pub max_allowed_noise: f64,
    #[serde(default = "RadioConfig::default_receive_start_snr")]
    pub receive_start_snr: f64,
    #[serde(default = "RadioConfig::default_corruption_snr")]
    pub corruption_snr: f64,
    #[serde(default = "RadioConfig::default_min_wait")]
    pub min_wait: u64,
    #[serde(default = "RadioConfig::default_random_wait")]
    pub random_wait: u64,
    #[serde(default = "RadioConfig::default_min_backoff")]
    pub min_backoff: u64,
    #[serde(default = "RadioConfig::default_random_backoff")]
    pub random_backoff: u64,
    #[serde(default = "RadioConfig::default_transmission_time")]
    pub transmission_time: u64,
}

impl RadioConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_distance > 0.0) {
            return Err(format!("radio range must be positive, got {}", self.max_distance));
        }
        if !(self.noise_variance > 0.0) {
            return Err("noise variance must be positive".into());
        }
        if self.corruption_snr > self.receive_start_snr {
            return Err(format!(
                "corruption SNR {} is above the receive SNR {}",
                self.corruption_snr, self.receive_start_snr
            ));
        }
        if self.transmission_time == 0 {
            return Err("transmission time must be at least one tick".into());
        }
        Ok(())
    }

    fn default_max_distance() -> f64 {
        10.0
    }
    fn default_path_loss_exponent() -> f64 {
        2.0
    }
    fn default_transmit_intensity() -> f64 {
        100.0
    }
    fn default_noise_variance() -> f64 {
        0.025
    }
    fn default_max_allowed_noise() -> f64 {
        5.0
    }
    fn default_receive_start_snr() -> f64 {
        4.0
    }
    fn default_corruption_snr() -> f64 {
        2.0
    }
    fn default_min_wait() -> u64 {
        200 * 25
    }
    fn default_random_wait() -> u64 {
        128 * 25
    }
    fn default_min_backoff() -> u64 {
        100 * 25
    }
    fn default_random_backoff() -> u64 {
        30 * 25
    }
    fn default_transmission_time() -> u64 {
        960
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            max_distance: Self::default_max_distance(),
            path_loss_exponent: Self::default_path_loss_exponent(),
            transmit_intensity: Self::default_transmit_intensity(),
            noise_variance: Self::default_noise_variance(),
            max_allowed_noise: Self::default_max_allowed_noise(),
            receive_start_snr: Self::default_receive_start_snr(),
            corruption_snr: Self::default_corruption_snr(),
            min_wait: Self::default_min_wait(),
            random_wait: Self::default_random_wait(),
            min_backoff: Self::default_min_backoff(),
            random_backoff: Self::default_random_backoff(),
            transmission_time: Self::default_transmission_time(),
        }
    }
}
