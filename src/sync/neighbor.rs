//! Per-neighbor relative rate estimation.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::register::Register;
use crate::sync::regression::{LinearFit, RegressionEntry, MAX_ENTRIES};
use crate::sync::NodeId;

/// Capacity of a [`NeighborTable`].
pub const MAX_NEIGHBORS: usize = 8;

/// What is known about one neighbor: its last samples of
/// `(local time, neighbor clock - local time)` and the relative rate fitted
/// through them.
#[derive(Debug, Clone)]
pub struct Neighbor {
    id: NodeId,
    /// Receiver-local time of the last beacon
    last_heard: Register,
    /// Relative rate of the neighbor's hardware clock against ours
    rate: f32,
    samples: VecDeque<RegressionEntry>,
}

impl Neighbor {
    fn new(id: NodeId, heard: Register) -> Self {
        Self {
            id,
            last_heard: heard,
            rate: 0.0,
            samples: VecDeque::with_capacity(MAX_ENTRIES),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn last_heard(&self) -> Register {
        self.last_heard
    }

    pub fn samples(&self) -> usize {
        self.samples.len()
    }

    fn add_sample(&mut self, neighbor_clock: Register, local: Register) {
        if self.samples.len() == MAX_ENTRIES {
            self.samples.pop_front();
        }
        self.samples.push_back(RegressionEntry {
            local,
            offset: neighbor_clock.age_since(local),
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct NeighborTable {
    neighbors: Vec<Neighbor>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Neighbor> {
        self.neighbors.iter().find(|n| n.id == id)
    }

    pub fn rate_of(&self, id: NodeId) -> Option<f32> {
        self.get(id).map(Neighbor::rate)
    }

    /// Drops neighbors silent for at least `timeout` ticks before `now`.
    pub fn evict_silent(&mut self, now: Register, timeout: u64) {
        self.neighbors.retain(|n| {
            let keep = now.subtract(n.last_heard).to_long() < timeout;
            if !keep {
                debug!("neighbor {} silent for too long, evicted", n.id);
            }
            keep
        });
    }

    /// Records a beacon from `id` carrying its hardware clock, received at
    /// local time `receipt`, and returns the updated relative rate. A new
    /// neighbor starts with rate zero; when the table is full the least
    /// recently heard neighbor makes room.
    pub fn record(&mut self, id: NodeId, neighbor_clock: Register, receipt: Register) -> f32 {
        let index = match self.neighbors.iter().position(|n| n.id == id) {
            Some(index) => index,
            None => {
                if self.neighbors.len() == MAX_NEIGHBORS {
                    self.reclaim(receipt);
                }
                self.neighbors.push(Neighbor::new(id, receipt));
                self.neighbors.len() - 1
            }
        };

        let neighbor = &mut self.neighbors[index];
        let known = !neighbor.samples.is_empty();
        neighbor.add_sample(neighbor_clock, receipt);
        neighbor.last_heard = receipt;
        neighbor.rate = if known {
            let entries: Vec<RegressionEntry> = neighbor.samples.iter().copied().collect();
            LinearFit::fit(&entries, 0.0).map_or(0.0, |fit| fit.slope() as f32)
        } else {
            0.0
        };
        neighbor.rate
    }

    fn reclaim(&mut self, now: Register) {
        let stalest = self
            .neighbors
            .iter()
            .enumerate()
            .max_by_key(|(_, n)| now.subtract(n.last_heard).to_u32())
            .map(|(i, _)| i);
        if let Some(i) = stalest {
            let gone = self.neighbors.remove(i);
            trace!("neighbor table full, reclaiming slot of {}", gone.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_follows_neighbor_clock_speed() {
        let mut table = NeighborTable::new();
        // neighbor gains 1 tick per 1000
        for i in 0..6u32 {
            let local = 10_000 + i * 100_000;
            let theirs = 50_000 + i * 100_100;
            table.record(4, Register::new(theirs), Register::new(local));
        }
        let rate = table.rate_of(4).unwrap();
        assert!((rate - 0.001).abs() < 1e-6);
    }

    #[test]
    fn new_neighbor_has_zero_rate() {
        let mut table = NeighborTable::new();
        assert_eq!(table.record(2, Register::new(500), Register::new(100)), 0.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn silent_neighbors_are_evicted() {
        let mut table = NeighborTable::new();
        table.record(1, Register::new(0), Register::new(0));
        table.record(2, Register::new(0), Register::new(900));
        table.evict_silent(Register::new(1_000), 500);
        assert!(table.get(1).is_none());
        assert!(table.get(2).is_some());
    }

    #[test]
    fn full_table_reclaims_least_recently_heard() {
        let mut table = NeighborTable::new();
        for id in 0..MAX_NEIGHBORS as NodeId {
            table.record(id, Register::ZERO, Register::new(100 + id * 10));
        }
        table.record(99, Register::ZERO, Register::new(1_000));
        assert_eq!(table.len(), MAX_NEIGHBORS);
        assert!(table.get(0).is_none());
        assert!(table.get(99).is_some());
    }
}
