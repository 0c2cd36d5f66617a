//! Simulation context: scheduler, channel, nodes and the shared random source.
//!
//! One `Simulation` is one exclusive-access domain. Every mutation of its
//! scheduler, clocks and channel happens from `tick`/`run_until` on the
//! caller's thread.

pub mod config;

pub use config::{RunConfig, SimConfig};

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{SimError, SimResult};
use crate::node::{Node, NodeStatus};
use crate::radio::{Channel, RadioPacket, SendOutcome, SenseOutcome, Slot, TransmissionEnd};
use crate::register::Register;
use crate::rng::SimRng;
use crate::scheduler::{EventId, Scheduler};
use crate::sync::{jittered_period, NodeId, Protocol, ProtocolKind, TimeSync};
use crate::topology::Position;

/// Scheduler payloads. Every event names the radio slot (equal to the node's
/// index) it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    BeaconTimer(Slot),
    ChannelSense(Slot),
    TransmissionEnd(Slot),
}

pub struct Simulation {
    config: SimConfig,
    scheduler: Scheduler<Event>,
    channel: Channel,
    nodes: Vec<Node>,
    index: HashMap<NodeId, Slot>,
    rng: SimRng,
}

impl Simulation {
    /// Validates `config` and builds an empty simulation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            scheduler: Scheduler::new(),
            channel: Channel::new(config.radio.clone()),
            nodes: Vec::new(),
            index: HashMap::new(),
            rng: SimRng::new(config.simulation.seed),
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn current_tick(&self) -> u64 {
        self.scheduler.current_tick()
    }

    /// Whole simulated seconds elapsed.
    pub fn current_second(&self) -> u64 {
        self.scheduler.current_tick() / self.config.simulation.ticks_per_second
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> SimResult<&Node> {
        self.index
            .get(&id)
            .map(|&slot| &self.nodes[slot])
            .ok_or(SimError::UnknownNode(id))
    }

    fn slot_of(&self, id: NodeId) -> SimResult<Slot> {
        self.index.get(&id).copied().ok_or(SimError::UnknownNode(id))
    }

    /// Adds a powered-off node running `kind`.
    pub fn create_node(
        &mut self,
        kind: ProtocolKind,
        id: NodeId,
        position: Position,
    ) -> SimResult<&Node> {
        if self.index.contains_key(&id) {
            warn!("refusing to create node {id} twice");
            return Err(SimError::DuplicateNode(id));
        }

        let mut clock = Clock::drifting(&self.config.clock, &mut self.rng);
        if kind.random_clock_start() {
            clock.set_value(Register::new(self.rng.next_i32().wrapping_abs() as u32));
        }
        let protocol = Protocol::new(kind, id, &self.config.sync);
        let slot = self.channel.add_radio(position);
        debug!(
            "node {id}: {kind:?} at ({}, {}, {}), drift {:.2} ppm",
            position.x,
            position.y,
            position.z,
            clock.drift() * 1_000_000.0
        );

        self.nodes.push(Node::new(id, slot, position, clock, protocol));
        self.index.insert(id, slot);
        Ok(&self.nodes[slot])
    }

    /// Powers a node up and starts its beacon timer.
    pub fn turn_on(&mut self, id: NodeId) -> SimResult<()> {
        let slot = self.slot_of(id)?;
        let node = &mut self.nodes[slot];
        if node.is_running() {
            return Err(SimError::AlreadyRunning(id));
        }

        let period = self.config.sync.beacon_period;
        let nominal = if self.config.sync.beacon_jitter && node.protocol().beacon_jitter() {
            jittered_period(period, &mut self.rng)
        } else {
            period
        };
        let drift = node.clock().drift();
        node.beacon_timer
            .start_periodic(nominal, drift, &mut self.scheduler, Event::BeaconTimer(slot))?;
        node.set_running(true);
        self.channel.power_on(slot);
        info!("node {id}: on, beacon every {nominal} ticks");
        Ok(())
    }

    /// Stops the node's timers and removes its radio from the channel.
    pub fn turn_off(&mut self, id: NodeId) -> SimResult<()> {
        let slot = self.slot_of(id)?;
        if self.nodes[slot].is_running() {
            self.power_down(slot);
        }
        Ok(())
    }

    fn power_down(&mut self, slot: Slot) {
        let node = &mut self.nodes[slot];
        node.beacon_timer.stop(&mut self.scheduler);
        if let Some(pending) = node.mac_event.take() {
            self.scheduler.cancel(pending);
        }
        node.set_running(false);
        let id = node.id();
        let end = self.channel.power_off(slot, &mut self.rng);
        self.apply_transmission_end(end);
        info!("node {id}: off");
    }

    /// Advances virtual time by exactly one tick and dispatches its events.
    pub fn tick(&mut self) {
        self.scheduler.advance();
        self.advance_clocks(1);
        self.dispatch_due();
    }

    /// Runs until virtual time reaches `horizon`. Idle stretches are skipped
    /// in one step: running clocks advance by the whole gap with a single
    /// noise draw.
    pub fn run_until(&mut self, horizon: u64) {
        loop {
            let now = self.scheduler.current_tick();
            if now >= horizon {
                break;
            }
            let target = match self.scheduler.next_tick() {
                Some(next) if next <= horizon => next,
                _ => horizon,
            };
            let gap = target - now;
            self.scheduler.advance_by(gap);
            self.advance_clocks(gap);
            self.dispatch_due();
        }
    }

    /// Runs to the configured horizon, then shuts every node down.
    pub fn run(&mut self) {
        let horizon = self.config.simulation.duration_ticks();
        info!("running {} nodes until tick {horizon}", self.nodes.len());
        self.run_until(horizon);
        self.shutdown();
    }

    pub fn shutdown(&mut self) {
        for slot in 0..self.nodes.len() {
            if self.nodes[slot].is_running() {
                self.power_down(slot);
            }
        }
        let stats = self.channel.stats();
        info!(
            "shutdown at tick {}: {} transmissions, {} deliveries, {} corrupted",
            self.current_tick(),
            stats.transmissions,
            stats.deliveries,
            stats.corrupted
        );
    }

    pub fn status_line(&self, id: NodeId) -> SimResult<String> {
        Ok(self.node(id)?.status_line(self.current_second()))
    }

    /// Status lines of every node, in creation order.
    pub fn status_lines(&self) -> Vec<String> {
        let second = self.current_second();
        self.nodes.iter().map(|n| n.status_line(second)).collect()
    }

    pub fn statuses(&self) -> Vec<NodeStatus> {
        let second = self.current_second();
        self.nodes.iter().map(|n| n.status(second)).collect()
    }

    fn advance_clocks(&mut self, ticks: u64) {
        for node in self.nodes.iter_mut().filter(|n| n.is_running()) {
            node.clock_mut().advance(ticks, &mut self.rng);
        }
    }

    fn dispatch_due(&mut self) {
        while let Some((id, event)) = self.scheduler.pop_due() {
            match event {
                Event::BeaconTimer(slot) => self.beacon_due(id, slot),
                Event::ChannelSense(slot) => {
                    if self.take_mac_event(id, slot) {
                        self.channel_sense(slot);
                    }
                }
                Event::TransmissionEnd(slot) => {
                    if self.take_mac_event(id, slot) {
                        let end = self.channel.end_transmission(slot, &mut self.rng);
                        self.apply_transmission_end(end);
                    }
                }
            }
        }
    }

    /// Schedules the next MAC step of `slot`. A radio has at most one in flight.
    fn schedule_mac(&mut self, after: u64, event: Event, slot: Slot) {
        let id = self.scheduler.schedule_in(after, event);
        if let Some(stale) = self.nodes[slot].mac_event.replace(id) {
            self.scheduler.cancel(stale);
        }
    }

    /// Claims a fired MAC event. Events left over from before a power cycle
    /// were cancelled, so a mismatch only means the event is not ours.
    fn take_mac_event(&mut self, id: EventId, slot: Slot) -> bool {
        let node = &mut self.nodes[slot];
        if node.mac_event != Some(id) {
            return false;
        }
        node.mac_event = None;
        true
    }

    fn beacon_due(&mut self, id: EventId, slot: Slot) {
        let node = &mut self.nodes[slot];
        if !node
            .beacon_timer
            .fired(id, &mut self.scheduler, Event::BeaconTimer(slot))
            || !node.is_running()
        {
            return;
        }

        let ctx = node.context();
        let Some(beacon) = node.protocol_mut().on_beacon_due(&ctx) else {
            return;
        };
        debug!(
            "node {}: beacon root {} seq {} clock {}",
            ctx.node_id, beacon.root_id, beacon.sequence, beacon.clock
        );

        let packet = RadioPacket::new(ctx.node_id, beacon, ctx.local_time);
        match self.channel.send(slot, packet, &mut self.rng) {
            SendOutcome::NotReady => {
                node.stats.beacons_refused += 1;
                debug!("node {}: radio busy, beacon dropped", ctx.node_id);
            }
            SendOutcome::Sense { after } => {
                self.schedule_mac(after, Event::ChannelSense(slot), slot);
            }
            SendOutcome::Postponed => {
                debug!("node {}: receiving, send postponed", ctx.node_id);
            }
        }
    }

    fn channel_sense(&mut self, slot: Slot) {
        let clocks: Vec<Register> = self.nodes.iter().map(|n| n.clock().value()).collect();
        match self.channel.sense(slot, &clocks, &mut self.rng) {
            SenseOutcome::Backoff { after } => {
                self.schedule_mac(after, Event::ChannelSense(slot), slot);
            }
            SenseOutcome::Transmit { end_after } => {
                self.nodes[slot].stats.beacons_sent += 1;
                self.schedule_mac(end_after, Event::TransmissionEnd(slot), slot);
            }
            SenseOutcome::Idle => {}
        }
    }

    fn apply_transmission_end(&mut self, end: TransmissionEnd) {
        for (rx, packet) in end.deliveries {
            let node = &mut self.nodes[rx];
            if !node.is_running() {
                continue;
            }
            node.stats.beacons_received += 1;
            let ctx = node.context();
            node.protocol_mut()
                .on_beacon_received(&ctx, &packet.payload, packet.receipt_time());
        }
        for (slot, after) in end.resumed {
            self.schedule_mac(after, Event::ChannelSense(slot), slot);
        }
    }
}
