use crate::register::Register;
use crate::sync::election::{RootElection, Verdict};
use crate::sync::logical_clock::LogicalClock;
use crate::sync::tracker::{AdaptiveValue, Feedback};
use crate::sync::{Beacon, NodeId, SyncConfig, SyncContext, TimeSync};

/// Flooding synchronization whose clock rate is steered by an
/// [`AdaptiveValue`]. Each accepted beacon resets the logical clock to the
/// advertised time; the sign of the skew it had accumulated tells the tracker
/// whether the clock runs too fast or too slow.
#[derive(Debug, Clone)]
pub struct TrackerSync {
    node_id: NodeId,
    election: RootElection,
    clock: LogicalClock,
    rate: AdaptiveValue,
    tolerance: i32,
    synced: bool,
}

impl TrackerSync {
    pub fn new(node_id: NodeId, config: &SyncConfig) -> Self {
        Self {
            node_id,
            election: RootElection::flooding(node_id),
            clock: LogicalClock::new(),
            rate: AdaptiveValue::new(0.0, config),
            tolerance: config.tracker_tolerance,
            synced: false,
        }
    }

    pub fn rate(&self) -> &AdaptiveValue {
        &self.rate
    }

    fn feedback(&self, skew: i32) -> Feedback {
        if skew > self.tolerance {
            Feedback::Lower
        } else if skew < -self.tolerance {
            Feedback::Greater
        } else {
            Feedback::Good
        }
    }
}

impl TimeSync for TrackerSync {
    fn on_beacon_received(&mut self, _ctx: &SyncContext, beacon: &Beacon, receipt: Register) {
        self.clock.update(receipt);
        if self.election.observe(beacon) == Verdict::Ignored {
            return;
        }
        self.synced = true;

        let skew = self.clock.value_at(receipt).age_since(beacon.clock);
        self.clock.set_value(beacon.clock, receipt);

        self.rate.adjust(self.feedback(skew));
        self.clock.set_rate(self.rate.value() as f32);
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
        ((1.0 + self.rate.value()) * (1.0 + ctx.drift)) as f32
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
