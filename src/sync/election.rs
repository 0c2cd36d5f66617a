//! Root election by smallest node id, flooded with sequence numbers.

use log::info;

use crate::sync::{Beacon, NodeId, SyncConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Tracks a root other than itself
    Follower,
    /// Has no root yet and will claim the role after the timeout
    Candidate,
    Root,
}

/// Effect of a beacon on the election state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A smaller root was adopted along with its sequence
    NewRoot,
    /// Same root, newer sequence
    NewerSequence,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct RootElection {
    node_id: NodeId,
    root_id: Option<NodeId>,
    sequence: u32,
    /// Beacon periods since the last sign of a smaller root
    heart_beats: u32,
    root_timeout: u32,
    ignore_root_msg: u32,
}

impl RootElection {
    /// Starts without a root; the node claims the role after `root_timeout`
    /// silent beacon periods unless it is the forced root.
    pub fn with_timeout(node_id: NodeId, config: &SyncConfig) -> Self {
        let root_id = (config.forced_root == Some(node_id)).then_some(node_id);
        Self {
            node_id,
            root_id,
            sequence: 0,
            heart_beats: 0,
            root_timeout: config.root_timeout,
            ignore_root_msg: config.ignore_root_msg,
        }
    }

    /// Every node starts as its own root and yields to smaller ids at once.
    pub fn flooding(node_id: NodeId) -> Self {
        Self {
            node_id,
            root_id: Some(node_id),
            sequence: 0,
            heart_beats: 0,
            root_timeout: u32::MAX,
            ignore_root_msg: 0,
        }
    }

    pub fn role(&self) -> Role {
        match self.root_id {
            None => Role::Candidate,
            Some(root) if root == self.node_id => Role::Root,
            Some(_) => Role::Follower,
        }
    }

    pub fn is_root(&self) -> bool {
        self.role() == Role::Root
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn heart_beats(&self) -> u32 {
        self.heart_beats
    }

    pub fn observe(&mut self, beacon: &Beacon) -> Verdict {
        let smaller = self.root_id.map_or(true, |root| beacon.root_id < root);
        let fresh_root = self.is_root() && self.heart_beats < self.ignore_root_msg;

        let verdict = if smaller && !fresh_root {
            if self.root_id != Some(beacon.root_id) {
                info!(
                    "node {}: adopting root {} (was {:?})",
                    self.node_id, beacon.root_id, self.root_id
                );
            }
            self.root_id = Some(beacon.root_id);
            self.sequence = beacon.sequence;
            Verdict::NewRoot
        } else if self.root_id == Some(beacon.root_id) && beacon.is_newer_than(self.sequence) {
            self.sequence = beacon.sequence;
            Verdict::NewerSequence
        } else {
            return Verdict::Ignored;
        };

        if beacon.root_id < self.node_id {
            self.heart_beats = 0;
        }
        verdict
    }

    /// Beacon timer fired. A candidate counts towards the timeout and claims
    /// the root role once it expires. Returns whether the node has a root to
    /// advertise.
    pub fn on_period(&mut self) -> bool {
        if self.root_id.is_none() {
            self.heart_beats += 1;
            if self.heart_beats >= self.root_timeout {
                info!("node {}: no root heard, claiming the role", self.node_id);
                self.sequence = 0;
                self.root_id = Some(self.node_id);
            }
        }
        self.root_id.is_some()
    }

    /// Takes over as root when the current one has been silent too long.
    pub fn claim_if_orphaned(&mut self) -> bool {
        if self.is_root() || self.heart_beats < self.root_timeout {
            return false;
        }
        info!(
            "node {}: root {:?} timed out, claiming the role",
            self.node_id, self.root_id
        );
        self.heart_beats = 0;
        self.root_id = Some(self.node_id);
        self.sequence = self.sequence.wrapping_add(1);
        true
    }

    /// A period passed without sending.
    pub fn skipped(&mut self) {
        self.heart_beats = self.heart_beats.saturating_add(1);
    }

    /// A beacon carrying the current sequence went out.
    pub fn sent(&mut self) {
        if self.is_root() {
            self.sequence = self.sequence.wrapping_add(1);
        }
        self.heart_beats = self.heart_beats.saturating_add(1);
    }
}
