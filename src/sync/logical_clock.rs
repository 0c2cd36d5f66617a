use crate::register::Register;

/// Software clock running at `1 + rate` times the hardware clock.
///
/// The value is anchored at `update_local_time`; reading it at a later local
/// time adds the rate-corrected progress since the anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogicalClock {
    value: Register,
    rate: f32,
    update_local_time: Register,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn progress(&self, local: Register) -> i32 {
        let time_passed = local.age_since(self.update_local_time);
        time_passed.wrapping_add((time_passed as f32 * self.rate) as i32)
    }

    /// Moves the anchor to `local`, folding in the progress since the last one.
    pub fn update(&mut self, local: Register) {
        self.value = self.value.add_signed(self.progress(local));
        self.update_local_time = local;
    }

    pub fn value_at(&self, local: Register) -> Register {
        self.value.add_signed(self.progress(local))
    }

    pub fn set_value(&mut self, time: Register, local: Register) {
        self.value = time;
        self.update_local_time = local;
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }
}
