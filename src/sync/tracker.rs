//! Bounded adaptive value tracker.
//!
//! The tracked value moves by a step `delta` in the direction a feedback asks
//! for. Repeated feedback in the same direction grows the step; a reversal or
//! a "good" verdict shrinks it. Both the value and the step stay inside their
//! configured bounds.

use serde::Serialize;

use crate::sync::SyncConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Feedback {
    /// The value should grow
    Greater,
    /// The value should shrink
    Lower,
    Good,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveValue {
    value: f64,
    delta: f64,
    lower_bound: f64,
    upper_bound: f64,
    delta_min: f64,
    delta_max: f64,
    increase_factor: f64,
    decrease_factor: f64,
    last: Option<Feedback>,
}

impl AdaptiveValue {
    pub fn new(start: f64, config: &SyncConfig) -> Self {
        Self {
            value: start.clamp(config.tracker_lower_bound, config.tracker_upper_bound),
            delta: config
                .tracker_delta_start
                .clamp(config.tracker_delta_min, config.tracker_delta_max),
            lower_bound: config.tracker_lower_bound,
            upper_bound: config.tracker_upper_bound,
            delta_min: config.tracker_delta_min,
            delta_max: config.tracker_delta_max,
            increase_factor: config.tracker_increase_factor,
            decrease_factor: config.tracker_decrease_factor,
            last: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn adjust(&mut self, feedback: Feedback) {
        let direction = match feedback {
            Feedback::Good => {
                self.shrink();
                self.last = Some(feedback);
                return;
            }
            Feedback::Greater => 1.0,
            Feedback::Lower => -1.0,
        };

        match self.last {
            Some(last) if last == feedback => self.grow(),
            Some(Feedback::Good) | None => {}
            Some(_) => self.shrink(),
        }

        self.value = (self.value + direction * self.delta).clamp(self.lower_bound, self.upper_bound);
        self.last = Some(feedback);
    }

    fn grow(&mut self) {
        self.delta = (self.delta * self.increase_factor).min(self.delta_max);
    }

    fn shrink(&mut self) {
        self.delta = (self.delta / self.decrease_factor).max(self.delta_min);
    }
}
