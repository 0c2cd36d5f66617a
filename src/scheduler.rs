//! Discrete-event queue and virtual time.
//!
//! Pending events are kept in a `BTreeMap` keyed by `(fire tick, sequence)`.
//! The sequence number is handed out at registration, so events sharing a
//! tick come out in the order they were registered. Anything scheduled while
//! a tick is being dispatched lands on a later tick.

use std::collections::BTreeMap;

/// Handle to a pending event. Ordered by fire tick, then registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId {
    tick: u64,
    seq: u64,
}

impl EventId {
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Tick-driven event queue. `E` is the event payload dispatched by the owner.
#[derive(Debug)]
pub struct Scheduler<E> {
    now: u64,
    next_seq: u64,
    pending: BTreeMap<EventId, E>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.now
    }

    /// Registers `event` at `tick`. Ticks that are not in the future are
    /// moved to the next tick.
    pub fn schedule_at(&mut self, tick: u64, event: E) -> EventId {
        let id = EventId {
            tick: tick.max(self.now + 1),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert(id, event);
        id
    }

    pub fn schedule_in(&mut self, delay: u64, event: E) -> EventId {
        self.schedule_at(self.now.saturating_add(delay), event)
    }

    /// Removes a pending event. Returns `None` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: EventId) -> Option<E> {
        self.pending.remove(&id)
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn next_tick(&self) -> Option<u64> {
        self.pending.keys().next().map(|id| id.tick)
    }

    /// Moves virtual time forward by one tick.
    pub fn advance(&mut self) {
        self.advance_by(1);
    }

    /// Moves virtual time forward by `ticks`. Skipping over a pending event
    /// is a bug in the caller.
    pub fn advance_by(&mut self, ticks: u64) {
        let target = self.now + ticks;
        debug_assert!(
            self.next_tick().map_or(true, |t| t >= target),
            "advance_by({ticks}) from {} would skip an event at {:?}",
            self.now,
            self.next_tick()
        );
        self.now = target;
    }

    /// Pops the next event due at the current tick, in registration order.
    pub fn pop_due(&mut self) -> Option<(EventId, E)> {
        let entry = self.pending.first_entry()?;
        if entry.key().tick != self.now {
            return None;
        }
        Some(entry.remove_entry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_tick_fires_first() {
        let mut s = Scheduler::new();
        s.schedule_at(10, "late");
        s.schedule_at(5, "early");
        assert_eq!(s.next_tick(), Some(5));
    }

    #[test]
    fn past_ticks_are_clamped_to_next_tick() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_by(7);
        let id = s.schedule_at(3, ());
        assert_eq!(id.tick(), 8);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = Scheduler::new();
        let id = s.schedule_in(4, 1u8);
        assert_eq!(s.cancel(id), Some(1));
        assert_eq!(s.cancel(id), None);
        assert_eq!(s.pending(), 0);
    }
}
