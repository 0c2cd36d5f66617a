//! Shared radio channel with SNR-based reception and CSMA channel access.
//!
//! Every radio owns a slot in the channel. Signals decay with
//! `intensity / distance^alpha`; concurrent transmissions add up as noise at
//! each receiver. A receiver locks onto a packet when its SNR clears
//! `receive_start_snr` and drops it if the SNR later falls under
//! `corruption_snr`. Transmissions whose SNR never clears the start threshold
//! only raise the noise floor until they end.

use log::trace;
use serde::Serialize;

use crate::radio::{RadioConfig, RadioPacket};
use crate::register::Register;
use crate::rng::SimRng;
use crate::topology::Position;

/// Index of a radio in the channel.
pub type Slot = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Off,
    Idle,
    /// Holding a packet, waiting for channel access
    Sending,
    Transmitting,
    Receiving,
}

/// Result of handing a packet to the MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The radio is off or already holds a packet.
    NotReady,
    /// Sense the channel after `after` ticks.
    Sense { after: u64 },
    /// A reception is in progress; sensing resumes once it ends.
    Postponed,
}

/// Result of sensing the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseOutcome {
    /// Channel busy, sense again after `after` ticks.
    Backoff { after: u64 },
    /// Transmission started; it ends after `end_after` ticks.
    Transmit { end_after: u64 },
    /// Nothing to send.
    Idle,
}

/// Side effects of a transmission ending.
#[derive(Debug, Default)]
pub struct TransmissionEnd {
    /// Packets received intact, by receiving slot
    pub deliveries: Vec<(Slot, RadioPacket)>,
    /// Radios whose postponed send resumes sensing after the given delay
    pub resumed: Vec<(Slot, u64)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub transmissions: u64,
    pub deliveries: u64,
    pub corrupted: u64,
    pub rejected_sends: u64,
    pub backoffs: u64,
}

#[derive(Debug, Clone)]
struct Reception {
    sender: Slot,
    packet: RadioPacket,
    signal: f64,
    corrupted: bool,
}

#[derive(Debug, Clone)]
struct Radio {
    position: Position,
    on: bool,
    neighbors: Vec<Slot>,
    sending: bool,
    transmitting: bool,
    postponed: bool,
    outgoing: Option<RadioPacket>,
    /// Neighbors notified when the current transmission began
    audience: Vec<Slot>,
    reception: Option<Reception>,
    noise: f64,
}

impl Radio {
    fn new(position: Position) -> Self {
        Self {
            position,
            on: false,
            neighbors: Vec::new(),
            sending: false,
            transmitting: false,
            postponed: false,
            outgoing: None,
            audience: Vec::new(),
            reception: None,
            noise: 0.0,
        }
    }

    fn reset(&mut self) {
        let position = self.position;
        *self = Radio::new(position);
    }
}

fn snr(signal: f64, noise: f64, noise_variance: f64) -> f64 {
    signal / (noise_variance + noise)
}

pub struct Channel {
    config: RadioConfig,
    radios: Vec<Radio>,
    stats: ChannelStats,
}

impl Channel {
    pub fn new(config: RadioConfig) -> Self {
        Self {
            config,
            radios: Vec::new(),
            stats: ChannelStats::default(),
        }
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.radios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radios.is_empty()
    }

    /// Adds a powered-off radio.
    pub fn add_radio(&mut self, position: Position) -> Slot {
        self.radios.push(Radio::new(position));
        self.radios.len() - 1
    }

    pub fn position(&self, slot: Slot) -> Position {
        self.radios[slot].position
    }

    pub fn is_on(&self, slot: Slot) -> bool {
        self.radios[slot].on
    }

    pub fn state(&self, slot: Slot) -> RadioState {
        let r = &self.radios[slot];
        if !r.on {
            RadioState::Off
        } else if r.transmitting {
            RadioState::Transmitting
        } else if r.reception.is_some() {
            RadioState::Receiving
        } else if r.sending {
            RadioState::Sending
        } else {
            RadioState::Idle
        }
    }

    pub fn neighbors(&self, slot: Slot) -> &[Slot] {
        &self.radios[slot].neighbors
    }

    /// Current interference level at `slot`, excluding a packet being received.
    pub fn noise(&self, slot: Slot) -> f64 {
        self.radios[slot].noise
    }

    pub fn power_on(&mut self, slot: Slot) {
        self.radios[slot].on = true;
        self.update_neighborhoods();
    }

    /// Powers a radio down. A transmission in progress is cut short, so
    /// neighbors locked onto it drop the packet.
    pub fn power_off(&mut self, slot: Slot, rng: &mut SimRng) -> TransmissionEnd {
        let mut out = TransmissionEnd::default();
        if self.radios[slot].transmitting {
            self.finish_transmission(slot, true, rng, &mut out);
        }
        self.radios[slot].reset();
        self.update_neighborhoods();
        out
    }

    /// Recomputes every running radio's neighbor list.
    pub fn update_neighborhoods(&mut self) {
        let range = self.config.max_distance;
        let snapshot: Vec<(bool, Position)> =
            self.radios.iter().map(|r| (r.on, r.position)).collect();

        for (i, radio) in self.radios.iter_mut().enumerate() {
            radio.neighbors.clear();
            if !radio.on {
                continue;
            }
            for (j, (on, position)) in snapshot.iter().enumerate() {
                if i != j && *on && radio.position.distance_to(position) <= range {
                    radio.neighbors.push(j);
                }
            }
        }
    }

    /// Received signal strength at `to` for a transmission from `from`.
    pub fn signal_between(&self, from: Slot, to: Slot) -> f64 {
        let distance = self.radios[from]
            .position
            .distance_to(&self.radios[to].position)
            .max(1.0);
        self.config.transmit_intensity / distance.powf(self.config.path_loss_exponent)
    }

    pub fn is_channel_free(&self, slot: Slot) -> bool {
        let r = &self.radios[slot];
        let sensed = r.noise + r.reception.as_ref().map_or(0.0, |rec| rec.signal);
        sensed < self.config.max_allowed_noise * self.config.noise_variance
    }

    pub fn waiting_time(&self, rng: &mut SimRng) -> u64 {
        rng.jitter(self.config.min_wait, self.config.random_wait)
    }

    pub fn backoff_time(&self, rng: &mut SimRng) -> u64 {
        rng.jitter(self.config.min_backoff, self.config.random_backoff)
    }

    /// Hands a packet to the MAC. Only one packet may be pending per radio.
    pub fn send(&mut self, slot: Slot, packet: RadioPacket, rng: &mut SimRng) -> SendOutcome {
        let receiving = {
            let r = &mut self.radios[slot];
            if !r.on || r.sending {
                self.stats.rejected_sends += 1;
                return SendOutcome::NotReady;
            }
            r.sending = true;
            r.transmitting = false;
            r.outgoing = Some(packet);
            r.reception.is_some()
        };

        if receiving {
            self.radios[slot].postponed = true;
            SendOutcome::Postponed
        } else {
            SendOutcome::Sense {
                after: self.waiting_time(rng),
            }
        }
    }

    /// Senses the channel for a pending send. `clocks` holds every slot's
    /// current hardware clock, used for MAC-layer timestamps.
    pub fn sense(&mut self, slot: Slot, clocks: &[Register], rng: &mut SimRng) -> SenseOutcome {
        {
            let r = &self.radios[slot];
            if !r.on || !r.sending || r.transmitting || r.outgoing.is_none() {
                return SenseOutcome::Idle;
            }
        }
        if !self.is_channel_free(slot) {
            self.stats.backoffs += 1;
            let after = self.backoff_time(rng);
            trace!("slot {slot}: channel busy, backing off {after} ticks");
            return SenseOutcome::Backoff { after };
        }
        self.begin_transmission(slot, clocks);
        SenseOutcome::Transmit {
            end_after: self.config.transmission_time,
        }
    }

    fn begin_transmission(&mut self, slot: Slot, clocks: &[Register]) {
        let intensity = self.config.transmit_intensity;
        let radio = &mut self.radios[slot];
        let Some(packet) = radio.outgoing.as_mut() else {
            return;
        };
        // event time becomes the packet's age at the moment it hits the air
        packet.event_time = clocks[slot].subtract(packet.event_time);
        packet.intensity = intensity;
        let packet = packet.clone();

        radio.transmitting = true;
        radio.audience = radio.neighbors.clone();
        let audience = radio.audience.clone();
        self.stats.transmissions += 1;
        trace!("slot {slot}: transmission begins to {audience:?}");

        for rx in audience {
            let level = self.signal_between(slot, rx);
            self.reception_begin(rx, slot, level, &packet, clocks[rx]);
        }
    }

    fn reception_begin(
        &mut self,
        rx: Slot,
        sender: Slot,
        level: f64,
        packet: &RadioPacket,
        rx_clock: Register,
    ) {
        let cfg = &self.config;
        let r = &mut self.radios[rx];
        if !r.on {
            return;
        }

        if let Some(rec) = r.reception.as_mut() {
            r.noise += level;
            if !rec.corrupted && snr(rec.signal, r.noise, cfg.noise_variance) < cfg.corruption_snr {
                trace!("slot {rx}: reception from {} corrupted", rec.sender);
                rec.corrupted = true;
            }
        } else if !r.transmitting && snr(level, r.noise, cfg.noise_variance) > cfg.receive_start_snr {
            let mut copy = packet.clone();
            copy.timestamp = rx_clock;
            copy.event_time = rx_clock.subtract(packet.event_time);
            r.reception = Some(Reception {
                sender,
                packet: copy,
                signal: level,
                corrupted: false,
            });
            trace!("slot {rx}: reception from {sender} begins");
        } else {
            r.noise += level;
        }
    }

    /// Ends the transmission of `slot`, delivering intact packets to the
    /// neighbors that were locked onto it.
    pub fn end_transmission(&mut self, slot: Slot, rng: &mut SimRng) -> TransmissionEnd {
        let mut out = TransmissionEnd::default();
        if self.radios[slot].transmitting {
            self.finish_transmission(slot, false, rng, &mut out);
        }
        out
    }

    fn finish_transmission(
        &mut self,
        slot: Slot,
        aborted: bool,
        rng: &mut SimRng,
        out: &mut TransmissionEnd,
    ) {
        let audience = std::mem::take(&mut self.radios[slot].audience);
        for rx in audience {
            let level = self.signal_between(slot, rx);
            self.reception_end(rx, slot, level, aborted, rng, out);
        }

        let radio = &mut self.radios[slot];
        radio.transmitting = false;
        radio.sending = false;
        radio.outgoing = None;
    }

    fn reception_end(
        &mut self,
        rx: Slot,
        sender: Slot,
        level: f64,
        aborted: bool,
        rng: &mut SimRng,
        out: &mut TransmissionEnd,
    ) {
        let r = &mut self.radios[rx];
        match r.reception.take() {
            Some(rec) if rec.sender == sender => {
                if rec.corrupted || aborted {
                    self.stats.corrupted += 1;
                    trace!("slot {rx}: dropped corrupted packet from {sender}");
                } else {
                    self.stats.deliveries += 1;
                    out.deliveries.push((rx, rec.packet));
                }
                if r.postponed {
                    r.postponed = false;
                    let after = self.waiting_time(rng);
                    out.resumed.push((rx, after));
                }
            }
            other => {
                r.reception = other;
                r.noise = (r.noise - level).max(0.0);
            }
        }
    }
}
