//! Regression table and least-squares fit mapping local time to global time.
//!
//! Samples are `(local time, global - local)` pairs. The fitted line gives
//! `global = local + mean_offset + slope * (local - mean_local)`.

use crate::register::Register;

/// Capacity of every regression table.
pub const MAX_ENTRIES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegressionEntry {
    pub local: Register,
    pub offset: i32,
}

/// Fixed-capacity table of regression samples.
#[derive(Debug, Clone, Default)]
pub struct RegressionTable {
    slots: [Option<RegressionEntry>; MAX_ENTRIES],
}

impl RegressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.slots = [None; MAX_ENTRIES];
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegressionEntry> {
        self.slots.iter().flatten()
    }

    /// Adds a sample taken at `local`. Entries at least half the wrap range
    /// old are freed first; if no slot is free, the oldest entry is replaced
    /// and returned.
    pub fn insert(&mut self, local: Register, offset: i32) -> Option<RegressionEntry> {
        let mut free = None;
        let mut oldest = 0;
        let mut oldest_age = 0u32;

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(entry) = slot {
                if local.is_stale_relative_to(entry.local) {
                    *slot = None;
                } else {
                    let age = local.subtract(entry.local).to_u32();
                    if age >= oldest_age {
                        oldest_age = age;
                        oldest = i;
                    }
                }
            }
            if slot.is_none() {
                free = Some(i);
            }
        }

        let target = free.unwrap_or(oldest);
        self.slots[target].replace(RegressionEntry { local, offset })
    }
}

/// Least-squares line through a regression table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearFit {
    mean_local: Register,
    mean_offset: i32,
    slope: f64,
}

impl LinearFit {
    pub fn new(mean_local: Register, mean_offset: i32, slope: f64) -> Self {
        Self {
            mean_local,
            mean_offset,
            slope,
        }
    }

    /// Fits the table's samples. Keeps `previous_slope` when the samples do
    /// not determine one (fewer than two distinct local times).
    pub fn calculate(table: &RegressionTable, previous_slope: f64) -> Option<LinearFit> {
        let entries: Vec<RegressionEntry> = table.entries().copied().collect();
        Self::fit(&entries, previous_slope)
    }

    /// Least-squares fit over arbitrary samples. Local times are measured
    /// relative to the first sample so wrapped counters average correctly.
    pub fn fit(entries: &[RegressionEntry], previous_slope: f64) -> Option<LinearFit> {
        let first = *entries.first()?;
        let n = entries.len() as f64;

        let samples: Vec<(f64, f64)> = entries
            .iter()
            .map(|e| (e.local.age_since(first.local) as f64, e.offset as f64))
            .collect();

        let mean_dx = samples.iter().map(|(dx, _)| dx).sum::<f64>() / n;
        let mean_offset = samples.iter().map(|(_, y)| y).sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (dx, y) in &samples {
            let a = dx - mean_dx;
            sxx += a * a;
            sxy += a * (y - mean_offset);
        }
        let slope = if sxx != 0.0 { sxy / sxx } else { previous_slope };

        Some(LinearFit {
            mean_local: first.local.add_signed(mean_dx.round() as i32),
            mean_offset: mean_offset.round() as i32,
            slope,
        })
    }

    /// Maps a local timestamp onto the fitted global time.
    pub fn calculate_y(&self, local: Register) -> Register {
        let dx = local.age_since(self.mean_local) as f64;
        let correction = (self.slope * dx) as i32;
        local.add_signed(self.mean_offset).add_signed(correction)
    }

    pub fn mean_local(&self) -> Register {
        self.mean_local
    }

    pub fn mean_offset(&self) -> i32 {
        self.mean_offset
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn set_mean_local(&mut self, mean_local: Register) {
        self.mean_local = mean_local;
    }

    pub fn set_mean_offset(&mut self, mean_offset: i32) {
        self.mean_offset = mean_offset;
    }

    pub fn set_slope(&mut self, slope: f64) {
        self.slope = slope;
    }
}
