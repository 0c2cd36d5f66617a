//! Flooding time synchronization with a least-squares skew estimate.
//!
//! Followers collect `(local time, global - local)` samples from beacons of
//! their root and fit a line through them. The root advertises its own
//! estimate, which starts out as its hardware clock.

use log::debug;

use crate::register::Register;
use crate::sync::election::{RootElection, Verdict};
use crate::sync::regression::{LinearFit, RegressionTable};
use crate::sync::{Beacon, NodeId, SyncConfig, SyncContext, TimeSync};

/// Distance from the fit's reference point at which a root moves the
/// reference forward, keeping `local - mean_local` far from wrapping.
const ROOT_REFERENCE_SPAN: u64 = 0x2000_0000;

/// What happened to a beacon handed to [`Ftsp::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Not from the current root, or not newer
    Ignored,
    /// Outlier dropped, table kept
    Rejected,
    /// Outlier dropped and the table cleared after repeated offenses
    Discarded,
    /// Sample added; `table_reset` when adopting a new root cleared the table first
    Added { table_reset: bool },
}

#[derive(Debug, Clone)]
pub struct Ftsp {
    node_id: NodeId,
    election: RootElection,
    table: RegressionTable,
    fit: LinearFit,
    num_entries: usize,
    num_errors: u32,
    entry_valid_limit: usize,
    entry_send_limit: usize,
    entry_throwout_limit: i32,
    max_consecutive_errors: u32,
}

impl Ftsp {
    pub fn new(node_id: NodeId, config: &SyncConfig) -> Self {
        Self {
            node_id,
            election: RootElection::with_timeout(node_id, config),
            table: RegressionTable::new(),
            fit: LinearFit::default(),
            num_entries: 0,
            num_errors: 0,
            entry_valid_limit: config.entry_valid_limit,
            entry_send_limit: config.entry_send_limit,
            entry_throwout_limit: config.entry_throwout_limit,
            max_consecutive_errors: config.max_consecutive_errors,
        }
    }

    pub fn fit(&self) -> &LinearFit {
        &self.fit
    }

    pub fn table(&self) -> &RegressionTable {
        &self.table
    }

    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    pub fn is_root(&self) -> bool {
        self.election.is_root()
    }

    pub fn election(&self) -> &RootElection {
        &self.election
    }

    pub fn process(&mut self, beacon: &Beacon, receipt: Register) -> EntryOutcome {
        let table_reset = match self.election.observe(beacon) {
            Verdict::Ignored => return EntryOutcome::Ignored,
            Verdict::NewRoot => {
                self.clear_table();
                true
            }
            Verdict::NewerSequence => false,
        };
        self.add_entry(beacon, receipt, table_reset)
    }

    fn add_entry(&mut self, beacon: &Beacon, local: Register, table_reset: bool) -> EntryOutcome {
        let time_error = self.fit.calculate_y(local).age_since(beacon.clock);
        if self.is_synced() && time_error.unsigned_abs() > self.entry_throwout_limit as u32 {
            self.num_errors += 1;
            debug!(
                "node {}: beacon from {} off by {time_error} ticks ({} in a row)",
                self.node_id, beacon.node_id, self.num_errors
            );
            if self.num_errors >= self.max_consecutive_errors {
                debug!("node {}: clearing regression table", self.node_id);
                self.clear_table();
                return EntryOutcome::Discarded;
            }
            return EntryOutcome::Rejected;
        }

        self.num_errors = 0;
        self.table.insert(local, beacon.clock.age_since(local));
        if let Some(fit) = LinearFit::calculate(&self.table, self.fit.slope()) {
            self.fit = fit;
        }
        self.num_entries = self.table.len();
        EntryOutcome::Added { table_reset }
    }

    fn clear_table(&mut self) {
        self.table.clear();
        self.num_entries = 0;
        self.num_errors = 0;
    }
}

impl TimeSync for Ftsp {
    fn on_beacon_received(&mut self, _ctx: &SyncContext, beacon: &Beacon, receipt: Register) {
        self.process(beacon, receipt);
    }

    fn on_beacon_due(&mut self, ctx: &SyncContext) -> Option<Beacon> {
        if !self.election.on_period() {
            return None;
        }

        let local = ctx.local_time;
        let global = self.fit.calculate_y(local);

        if self.election.is_root() {
            if local.subtract(self.fit.mean_local()).to_long() >= ROOT_REFERENCE_SPAN {
                self.fit.set_mean_local(local);
                self.fit.set_mean_offset(global.age_since(local));
            }
        } else {
            self.election.claim_if_orphaned();
        }

        if self.num_entries < self.entry_send_limit && !self.election.is_root() {
            self.election.skipped();
            return None;
        }

        let root_id = self.election.root_id()?;
        let beacon = Beacon::new(self.node_id, root_id, self.election.sequence(), global);
        self.election.sent();
        Some(beacon)
    }

    fn local_to_global(&self, local: Register) -> Register {
        self.fit.calculate_y(local)
    }

    fn rate_estimate(&self, _ctx: &SyncContext) -> f32 {
        self.fit.slope() as f32
    }

    fn root_id(&self) -> Option<NodeId> {
        self.election.root_id()
    }

    fn sequence(&self) -> u32 {
        self.election.sequence()
    }

    fn is_synced(&self) -> bool {
        self.num_entries >= self.entry_valid_limit || self.election.is_root()
    }

    fn beacon_jitter(&self) -> bool {
        false
    }
}
