use serde::{Deserialize, Serialize};

use crate::register::Register;
use crate::sync::{Beacon, NodeId};

/// A beacon on the air.
///
/// `event_time` changes meaning as the packet moves: the sender sets it to
/// its local send time, transmission start turns it into the packet's age, and
/// reception start turns the age back into receiver-local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioPacket {
    pub sender: NodeId,
    pub payload: Beacon,
    pub event_time: Register,
    /// Receiver clock at reception start
    pub timestamp: Register,
    /// Transmit intensity, set when transmission starts
    pub intensity: f64,
}

impl RadioPacket {
    pub fn new(sender: NodeId, payload: Beacon, event_time: Register) -> Self {
        Self {
            sender,
            payload,
            event_time,
            timestamp: Register::ZERO,
            intensity: 0.0,
        }
    }

    /// Receiver-local time of the sender's timestamped event.
    pub fn receipt_time(&self) -> Register {
        self.event_time
    }
}
