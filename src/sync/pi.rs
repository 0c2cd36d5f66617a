//! Proportional-integral clock control over flooded beacons.
//!
//! Inside the control window the skew to the advertised time feeds both the
//! logical clock rate (integral part, with a gain that fades towards the
//! window edge) and the clock value (proportional part). Outside the window
//! the clock snaps to the advertised time.

use log::debug;

use crate::register::Register;
use crate::sync::election::{RootElection, Verdict};
use crate::sync::logical_clock::LogicalClock;
use crate::sync::{Beacon, NodeId, SyncConfig, SyncContext, TimeSync};

/// Largest rate adjustment per unit of skew, before scaling by the window.
const RATE_GAIN: f32 = 0.000_004;

#[derive(Debug, Clone)]
pub struct PiSync {
    node_id: NodeId,
    election: RootElection,
    clock: LogicalClock,
    /// Skew, in ticks, beyond which the clock snaps
    boundary: f32,
    k_max: f32,
    beta: f32,
    synced: bool,
}

impl PiSync {
    pub fn new(node_id: NodeId, config: &SyncConfig) -> Self {
        let boundary = 2.0 * config.pi_max_ppm / 1_000_000.0 * config.beacon_period as f32;
        Self {
            node_id,
            election: RootElection::flooding(node_id),
            clock: LogicalClock::new(),
            boundary,
            k_max: RATE_GAIN / boundary,
            beta: config.pi_offset_gain,
            synced: false,
        }
    }

    pub fn boundary(&self) -> f32 {
        self.boundary
    }

    pub fn logical_clock(&self) -> &LogicalClock {
        &self.clock
    }
}

impl TimeSync for PiSync {
    fn on_beacon_received(&mut self, _ctx: &SyncContext, beacon: &Beacon, receipt: Register) {
        self.clock.update(receipt);
        if self.election.observe(beacon) == Verdict::Ignored {
            return;
        }
        self.synced = true;

        let mine = self.clock.value_at(receipt);
        let skew = beacon.clock.age_since(mine);

        if (skew as f32).abs() > self.boundary {
            debug!("node {}: skew {skew} outside window, snapping", self.node_id);
            self.clock.set_value(mine.add_signed(skew), receipt);
            return;
        }

        let k_i = (self.boundary - (skew as f32).abs()) * self.k_max / self.boundary;
        self.clock.set_rate(self.clock.rate() + k_i * skew as f32);

        let correction = (skew as f32 * self.beta) as i32;
        self.clock.set_value(mine.add_signed(correction), receipt);
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
        self.election.is_root() || self.synced
    }
}
