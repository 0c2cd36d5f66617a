use serde::{Deserialize, Serialize};

use crate::register::Register;
use crate::sync::NodeId;

/// Time synchronization beacon.
///
/// `clock` carries the sender's global time estimate, or its raw hardware
/// clock for strategies where the root advertises its own counter. `root_clock`
/// and `rate` are only meaningful to the strategies that use them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beacon {
    pub node_id: NodeId,
    pub root_id: NodeId,
    pub sequence: u32,
    pub clock: Register,
    pub root_clock: Register,
    pub rate: f32,
}

impl Beacon {
    pub fn new(node_id: NodeId, root_id: NodeId, sequence: u32, clock: Register) -> Self {
        Self {
            node_id,
            root_id,
            sequence,
            clock,
            root_clock: Register::ZERO,
            rate: 0.0,
        }
    }

    /// True when `self` carries a strictly newer sequence than `sequence`,
    /// allowing for wraparound.
    pub fn is_newer_than(&self, sequence: u32) -> bool {
        (self.sequence.wrapping_sub(sequence) as i32) > 0
    }
}
