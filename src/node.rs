//! A simulated device: hardware clock, radio slot and synchronization strategy.

use std::fmt;

use serde::Serialize;

use crate::clock::{Clock, Timer};
use crate::radio::Slot;
use crate::register::Register;
use crate::scheduler::EventId;
use crate::sync::{NodeId, Protocol, ProtocolKind, SyncContext, TimeSync};
use crate::topology::Position;

/// Per-node beacon counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub beacons_sent: u64,
    pub beacons_received: u64,
    /// Beacons the MAC refused because a previous one was still pending
    pub beacons_refused: u64,
}

/// One status record: `<second> <node id> <global time> <rate bits>`, with
/// the rate as the raw bits of an `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub second: u64,
    pub node: NodeId,
    pub global_time: u32,
    pub rate_bits: u32,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.second, self.node, self.global_time, self.rate_bits
        )
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    slot: Slot,
    position: Position,
    clock: Clock,
    protocol: Protocol,
    pub(crate) beacon_timer: Timer,
    /// Pending channel sense or transmission end of this node's radio
    pub(crate) mac_event: Option<EventId>,
    running: bool,
    pub(crate) stats: NodeStats,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        slot: Slot,
        position: Position,
        clock: Clock,
        protocol: Protocol,
    ) -> Self {
        Self {
            id,
            slot,
            position,
            clock,
            protocol,
            beacon_timer: Timer::new(),
            mac_event: None,
            running: false,
            stats: NodeStats::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn kind(&self) -> ProtocolKind {
        self.protocol.kind()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub(crate) fn protocol_mut(&mut self) -> &mut Protocol {
        &mut self.protocol
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn context(&self) -> SyncContext {
        SyncContext {
            node_id: self.id,
            local_time: self.clock.value(),
            drift: self.clock.drift(),
        }
    }

    /// Current global time estimate.
    pub fn global_time(&self) -> Register {
        self.protocol.local_to_global(self.clock.value())
    }

    pub fn status(&self, second: u64) -> NodeStatus {
        let rate = self.protocol.rate_estimate(&self.context());
        NodeStatus {
            second,
            node: self.id,
            global_time: self.global_time().to_u32(),
            rate_bits: rate.to_bits(),
        }
    }

    pub fn status_line(&self, second: u64) -> String {
        self.status(second).to_string()
    }
}
