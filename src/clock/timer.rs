//! Timers expressed in clock ticks, fired by the scheduler.
//!
//! A timer is armed with a nominal period in the owning clock's ticks. The
//! period is converted to scheduler ticks with the clock's drift at start
//! time, so a fast clock fires sooner in virtual time. Periodic timers keep
//! the converted period until restarted.

use crate::error::SimError;
use crate::scheduler::{EventId, Scheduler};

#[derive(Debug, Clone, Default)]
pub struct Timer {
    periodic: bool,
    /// Period in owner clock ticks, as requested
    nominal: u64,
    /// Period in scheduler ticks
    period: u64,
    pending: Option<EventId>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `floor(nominal / (1 + drift))`, at least one scheduler tick.
    pub fn convert(nominal: u64, drift: f64) -> u64 {
        let ticks = (nominal as f64 / (1.0 + drift)) as u64;
        ticks.max(1)
    }

    pub fn start_oneshot<E>(
        &mut self,
        nominal: u64,
        drift: f64,
        scheduler: &mut Scheduler<E>,
        event: E,
    ) -> Result<(), SimError> {
        self.start(false, nominal, drift, scheduler, event)
    }

    pub fn start_periodic<E>(
        &mut self,
        nominal: u64,
        drift: f64,
        scheduler: &mut Scheduler<E>,
        event: E,
    ) -> Result<(), SimError> {
        self.start(true, nominal, drift, scheduler, event)
    }

    fn start<E>(
        &mut self,
        periodic: bool,
        nominal: u64,
        drift: f64,
        scheduler: &mut Scheduler<E>,
        event: E,
    ) -> Result<(), SimError> {
        if nominal == 0 {
            return Err(SimError::InvalidPeriod(nominal));
        }
        // re-arming must not leave the old registration behind
        self.stop(scheduler);

        self.periodic = periodic;
        self.nominal = nominal;
        self.period = Self::convert(nominal, drift);
        self.pending = Some(scheduler.schedule_in(self.period, event));
        Ok(())
    }

    pub fn stop<E>(&mut self, scheduler: &mut Scheduler<E>) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    /// Handles a fired event. Returns false for events that do not belong to
    /// this timer's current registration. Periodic timers re-arm with the
    /// period computed at start.
    pub fn fired<E>(&mut self, id: EventId, scheduler: &mut Scheduler<E>, event: E) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        self.pending = None;
        if self.periodic {
            self.pending = Some(scheduler.schedule_in(self.period, event));
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    pub fn nominal(&self) -> u64 {
        self.nominal
    }

    /// Converted period in scheduler ticks.
    pub fn period(&self) -> u64 {
        self.period
    }
}
