//! Synchronization protocol parameters.

use serde::{Deserialize, Serialize};

use crate::sync::regression::MAX_ENTRIES;
use crate::sync::NodeId;

/// Tunables shared by every synchronization strategy. Times are in the
/// owning node's hardware clock ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Beacon period in clock ticks
    #[serde(default = "SyncConfig::default_beacon_period")]
    pub beacon_period: u64,
    /// Add per-node phase jitter to the beacon timer of flooding strategies
    #[serde(default = "SyncConfig::default_beacon_jitter")]
    pub beacon_jitter: bool,
    /// Node that starts out as root instead of waiting for the root timeout
    #[serde(default)]
    pub forced_root: Option<NodeId>,

    /// Beacon periods without root contact before proposing itself as root
    #[serde(default = "SyncConfig::default_root_timeout")]
    pub root_timeout: u32,
    /// Beacon periods a fresh root ignores advertisements of smaller roots
    #[serde(default = "SyncConfig::default_ignore_root_msg")]
    pub ignore_root_msg: u32,
    /// Table entries needed to count as synchronized
    #[serde(default = "SyncConfig::default_entry_valid_limit")]
    pub entry_valid_limit: usize,
    /// Table entries needed before broadcasting computed time
    #[serde(default = "SyncConfig::default_entry_send_limit")]
    pub entry_send_limit: usize,
    /// Largest accepted error between a beacon and the local estimate, in ticks
    #[serde(default = "SyncConfig::default_entry_throwout_limit")]
    pub entry_throwout_limit: i32,
    /// Consecutive thrown-out beacons that clear the table
    #[serde(default = "SyncConfig::default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// Largest expected clock drift; sets the PI control window
    #[serde(default = "SyncConfig::default_pi_max_ppm")]
    pub pi_max_ppm: f32,
    /// Share of the measured skew applied to the PI clock value
    #[serde(default = "SyncConfig::default_pi_offset_gain")]
    pub pi_offset_gain: f32,

    /// Skew, in ticks, below which the tracker reports "good"
    #[serde(default = "SyncConfig::default_tracker_tolerance")]
    pub tracker_tolerance: i32,
    #[serde(default = "SyncConfig::default_tracker_lower_bound")]
    pub tracker_lower_bound: f64,
    #[serde(default = "SyncConfig::default_tracker_upper_bound")]
    pub tracker_upper_bound: f64,
    #[serde(default = "SyncConfig::default_tracker_delta_min")]
    pub tracker_delta_min: f64,
    #[serde(default = "SyncConfig::default_tracker_delta_max")]
    pub tracker_delta_max: f64,
    #[serde(default = "SyncConfig::default_tracker_delta_start")]
    pub tracker_delta_start: f64,
    #[serde(default = "SyncConfig::default_tracker_factor")]
    pub tracker_increase_factor: f64,
    #[serde(default = "SyncConfig::default_tracker_factor")]
    pub tracker_decrease_factor: f64,

    /// Beacon periods of silence after which a neighbor record is dropped
    #[serde(default = "SyncConfig::default_neighbor_timeout_periods")]
    pub neighbor_timeout_periods: u64,
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.beacon_period == 0 {
            return Err("beacon period must be positive".into());
        }
        if self.beacon_period > i32::MAX as u64 {
            return Err(format!(
                "beacon period {} does not fit the 32-bit clock",
                self.beacon_period
            ));
        }
        if self.entry_valid_limit > MAX_ENTRIES || self.entry_send_limit > MAX_ENTRIES {
            return Err(format!("entry limits must not exceed {MAX_ENTRIES}"));
        }
        if self.entry_throwout_limit <= 0 {
            return Err("throwout limit must be positive".into());
        }
        if !(self.pi_max_ppm > 0.0 && self.pi_max_ppm.is_finite()) {
            return Err(format!(
                "PI drift bound must be positive, got {} ppm",
                self.pi_max_ppm
            ));
        }
        if !self.pi_offset_gain.is_finite() {
            return Err(format!("PI offset gain must be finite, got {}", self.pi_offset_gain));
        }
        if self.tracker_lower_bound >= self.tracker_upper_bound {
            return Err("tracker lower bound must be below the upper bound".into());
        }
        if self.tracker_delta_min <= 0.0 || self.tracker_delta_min > self.tracker_delta_max {
            return Err("tracker delta range is empty".into());
        }
        if self.tracker_increase_factor <= 1.0 || self.tracker_decrease_factor <= 1.0 {
            return Err("tracker factors must be greater than one".into());
        }
        Ok(())
    }

    /// Silence interval after which a neighbor is evicted, in clock ticks.
    pub fn neighbor_timeout(&self) -> u64 {
        self.beacon_period * self.neighbor_timeout_periods
    }

    fn default_beacon_period() -> u64 {
        30_000_000
    }
    fn default_beacon_jitter() -> bool {
        true
    }
    fn default_root_timeout() -> u32 {
        5
    }
    fn default_ignore_root_msg() -> u32 {
        4
    }
    fn default_entry_valid_limit() -> usize {
        4
    }
    fn default_entry_send_limit() -> usize {
        3
    }
    fn default_entry_throwout_limit() -> i32 {
        10_000
    }
    fn default_max_consecutive_errors() -> u32 {
        3
    }
    fn default_pi_max_ppm() -> f32 {
        100.0
    }
    fn default_pi_offset_gain() -> f32 {
        1.0
    }
    fn default_tracker_tolerance() -> i32 {
        1
    }
    fn default_tracker_lower_bound() -> f64 {
        -0.0001
    }
    fn default_tracker_upper_bound() -> f64 {
        0.0001
    }
    fn default_tracker_delta_min() -> f64 {
        0.000_000_001
    }
    fn default_tracker_delta_max() -> f64 {
        0.0001
    }
    fn default_tracker_delta_start() -> f64 {
        0.000_001
    }
    fn default_tracker_factor() -> f64 {
        2.0
    }
    fn default_neighbor_timeout_periods() -> u64 {
        5
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            beacon_period: Self::default_beacon_period(),
            beacon_jitter: Self::default_beacon_jitter(),
            forced_root: None,
            root_timeout: Self::default_root_timeout(),
            ignore_root_msg: Self::default_ignore_root_msg(),
            entry_valid_limit: Self::default_entry_valid_limit(),
            entry_send_limit: Self::default_entry_send_limit(),
            entry_throwout_limit: Self::default_entry_throwout_limit(),
            max_consecutive_errors: Self::default_max_consecutive_errors(),
            pi_max_ppm: Self::default_pi_max_ppm(),
            pi_offset_gain: Self::default_pi_offset_gain(),
            tracker_tolerance: Self::default_tracker_tolerance(),
            tracker_lower_bound: Self::default_tracker_lower_bound(),
            tracker_upper_bound: Self::default_tracker_upper_bound(),
            tracker_delta_min: Self::default_tracker_delta_min(),
            tracker_delta_max: Self::default_tracker_delta_max(),
            tracker_delta_start: Self::default_tracker_delta_start(),
            tracker_increase_factor: Self::default_tracker_factor(),
            tracker_decrease_factor: Self::default_tracker_factor(),
            neighbor_timeout_periods: Self::default_neighbor_timeout_periods(),
        }
    }
}
