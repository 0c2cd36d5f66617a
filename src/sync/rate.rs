//! Flooding of the root clock together with a multiplicative rate estimate.
//!
//! Every beacon carries the sender's hardware clock, its estimate of the root
//! clock and its estimate of the root's rate relative to itself. A receiver
//! combines the sender's rate with its own measured rate against the sender:
//! `(neighbor_rate + 1) * (root_rate + 1) - 1`.

use crate::register::Register;
use crate::sync::election::{RootElection, Verdict};
use crate::sync::neighbor::NeighborTable;
use crate::sync::{Beacon, NodeId, SyncConfig, SyncContext, TimeSync};

#[derive(Debug, Clone)]
pub struct RateFlooding {
    node_id: NodeId,
    election: RootElection,
    neighbors: NeighborTable,
    neighbor_timeout: u64,
    root_clock: Register,
    last_update: Register,
    root_rate: f32,
    anchored: bool,
}

impl RateFlooding {
    pub fn new(node_id: NodeId, config: &SyncConfig) -> Self {
        Self {
            node_id,
            election: RootElection::flooding(node_id),
            neighbors: NeighborTable::new(),
            neighbor_timeout: config.neighbor_timeout(),
            root_clock: Register::ZERO,
            last_update: Register::ZERO,
            root_rate: 0.0,
            anchored: false,
        }
    }

    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    pub fn root_rate(&self) -> f32 {
        self.root_rate
    }
}

impl TimeSync for RateFlooding {
    fn on_beacon_received(&mut self, ctx: &SyncContext, beacon: &Beacon, receipt: Register) {
        self.neighbors.evict_silent(ctx.local_time, self.neighbor_timeout);
        let neighbor_rate = self.neighbors.record(beacon.node_id, beacon.clock, receipt);

        self.root_rate = match self.election.observe(beacon) {
            Verdict::Ignored => return,
            Verdict::NewRoot => 0.0,
            Verdict::NewerSequence => (neighbor_rate + 1.0) * (beacon.rate + 1.0) - 1.0,
        };
        self.root_clock = beacon.root_clock;
        self.last_update = receipt;
        self.anchored = true;
    }

    fn on_beacon_due(&mut self, ctx: &SyncContext) -> Option<Beacon> {
        let local = ctx.local_time;
        if self.election.is_root() {
            self.root_clock = self.root_clock.add(local.subtract(self.last_update));
            self.last_update = local;
        }

        let root_id = self.election.root_id()?;
        let mut beacon = Beacon::new(self.node_id, root_id, self.election.sequence(), local);
        beacon.root_clock = self.local_to_global(local);
        beacon.rate = self.root_rate;
        self.election.sent();
        Some(beacon)
    }

    fn local_to_global(&self, local: Register) -> Register {
        let diff = local.age_since(self.last_update);
        let progress = diff.wrapping_add((self.root_rate * diff as f32) as i32);
        self.root_clock.add_signed(progress)
    }

    fn rate_estimate(&self, _ctx: &SyncContext) -> f32 {
        self.root_rate
    }

    fn root_id(&self) -> Option<NodeId> {
        self.election.root_id()
    }

    fn sequence(&self) -> u32 {
        self.election.sequence()
    }

    fn is_synced(&self) -> bool {
        self.election.is_root() || self.anchored
    }
}
