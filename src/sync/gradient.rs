//! Gradient descent on the skew to the flooded reference time.
//!
//! Each accepted beacon nudges the logical rate by a fixed fraction of the
//! skew per elapsed tick, then adopts the advertised time outright.

use log::debug;

use crate::register::Register;
use crate::sync::election::{RootElection, Verdict};
use crate::sync::logical_clock::LogicalClock;
use crate::sync::{Beacon, NodeId, SyncConfig, SyncContext, TimeSync};

/// Step size of the rate update.
const LEARNING_RATE: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct GradientSync {
    node_id: NodeId,
    election: RootElection,
    clock: LogicalClock,
    /// Skew, in ticks, beyond which the clock snaps and the rate resets
    boundary: f32,
    /// Receipt time of the last accepted beacon
    last_update: Option<Register>,
}

impl GradientSync {
    pub fn new(node_id: NodeId, config: &SyncConfig) -> Self {
        Self {
            node_id,
            election: RootElection::flooding(node_id),
            clock: LogicalClock::new(),
            boundary: 2.0 * config.pi_max_ppm / 1_000_000.0 * config.beacon_period as f32,
            last_update: None,
        }
    }

    pub fn boundary(&self) -> f32 {
        self.boundary
    }

    pub fn logical_clock(&self) -> &LogicalClock {
        &self.clock
    }
}

impl TimeSync for GradientSync {
    fn on_beacon_received(&mut self, _ctx: &SyncContext, beacon: &Beacon, receipt: Register) {
        self.clock.update(receipt);
        if self.election.observe(beacon) == Verdict::Ignored {
            return;
        }

        let mine = self.clock.value_at(receipt);
        let skew = beacon.clock.age_since(mine);
        let previous = self.last_update.replace(receipt);

        if (skew as f32).abs() > self.boundary {
            debug!("node {}: skew {skew} outside window, snapping", self.node_id);
            self.clock.set_value(mine.add_signed(skew), receipt);
            self.clock.set_rate(0.0);
            return;
        }

        if let Some(previous) = previous {
            let elapsed = receipt.age_since(previous);
            if elapsed > 0 {
                let gradient = skew as f32 / elapsed as f32;
                self.clock.set_rate(self.clock.rate() + LEARNING_RATE * gradient);
            }
        }
        self.clock.set_value(beacon.clock, receipt);
    }

    fn on_beacon_due(&mut self, ctx: &SyncContext) -> Option<Beacon> {
        let local = ctx.local_time;
        let clock = if self.election.is_root() {
            local
        } else {
            self.clock.value_at(local)
        };
        let root_id = self.election.root_id()?;
        let beacon = Beacon::new(self.node_id, root_id, self.election.sequence(), clock);
        self.election.sent();
        Some(beacon)
    }

    fn local_to_global(&self, local: Register) -> Register {
        self.clock.value_at(local)
    }

    fn rate_estimate(&self, ctx: &SyncContext) -> f32 {
        ((1.0 + self.clock.rate() as f64) * (1.0 + ctx.drift)) as f32
    }

    fn root_id(&self) -> Option<NodeId> {
        self.election.root_id()
    }

    fn sequence(&self) -> u32 {
        self.election.sequence()
    }

    fn is_synced(&self) -> bool {
        self.election.is_root() || self.last_update.is_some()
    }
}
