//! 32-bit wraparound register used for every timestamp in the simulator.
//!
//! Hardware counters on the simulated motes are 32 bits wide and overflow
//! silently. All arithmetic here wraps modulo 2^32; "how much time passed"
//! questions are answered with the signed reinterpretation of a difference.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// Ages at or beyond this value are considered stale (half the wrap range).
pub const HALF_RANGE: u32 = 0x7FFF_FFFF;

/// Unsigned 32-bit value with modulo-2^32 arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Register(u32);

impl Register {
    pub const ZERO: Register = Register(0);
    pub const MAX: Register = Register(u32::MAX);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Keeps the low 32 bits of `value`.
    pub const fn from_long(value: u64) -> Self {
        Self(value as u32)
    }

    /// Reinterprets a signed value as its two's-complement bit pattern.
    pub const fn from_signed(value: i32) -> Self {
        Self(value as u32)
    }

    pub fn add(self, other: Register) -> Register {
        Register(self.0.wrapping_add(other.0))
    }

    pub fn add_signed(self, amount: i32) -> Register {
        self.add(Register::from_signed(amount))
    }

    pub fn twos_complement(self) -> Register {
        Register((!self.0).wrapping_add(1))
    }

    /// `self - other`, computed as `self + twos_complement(other)`.
    pub fn subtract(self, other: Register) -> Register {
        self.add(other.twos_complement())
    }

    /// Scales the unsigned value and truncates toward zero into 32 bits.
    pub fn multiply(self, factor: f32) -> Register {
        let scaled = (factor as f64 * self.0 as f64).trunc();
        Register::from_long(scaled as i64 as u64)
    }

    pub const fn to_long(self) -> u64 {
        self.0 as u64
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn to_signed_int(self) -> i32 {
        self.0 as i32
    }

    pub fn to_f64(self) -> f64 {
        self.to_signed_int() as f64
    }

    /// Signed distance from `earlier` to `self`.
    pub fn age_since(self, earlier: Register) -> i32 {
        self.subtract(earlier).to_signed_int()
    }

    /// True when at least half the wrap range separates `self` from `earlier`.
    pub fn is_stale_relative_to(self, earlier: Register) -> bool {
        self.subtract(earlier).0 >= HALF_RANGE
    }

    /// Wraparound-aware ordering: `self` is before `other` when the signed
    /// difference `other - self` is positive.
    pub fn wrapping_cmp(self, other: Register) -> Ordering {
        other.subtract(self).to_signed_int().cmp(&0).reverse()
    }

    pub fn wrapping_lt(self, other: Register) -> bool {
        self.wrapping_cmp(other) == Ordering::Less
    }
}

impl From<u32> for Register {
    fn from(value: u32) -> Self {
        Register(value)
    }
}

impl From<Register> for u32 {
    fn from(value: Register) -> Self {
        value.0
    }
}

impl Add for Register {
    type Output = Register;

    fn add(self, rhs: Register) -> Register {
        Register::add(self, rhs)
    }
}

impl Add<i32> for Register {
    type Output = Register;

    fn add(self, rhs: i32) -> Register {
        self.add_signed(rhs)
    }
}

impl Sub for Register {
    type Output = Register;

    fn sub(self, rhs: Register) -> Register {
        self.subtract(rhs)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps_past_max() {
        let r = Register::MAX.add(Register::new(2));
        assert_eq!(r.to_u32(), 1);
    }

    #[test]
    fn subtract_matches_twos_complement_addition() {
        let a = Register::new(5);
        let b = Register::new(9);
        assert_eq!(a.subtract(b), a.add(b.twos_complement()));
        assert_eq!(a.subtract(b).to_signed_int(), -4);
    }

    #[test]
    fn twos_complement_of_zero_is_zero() {
        assert_eq!(Register::ZERO.twos_complement(), Register::ZERO);
    }

    #[test]
    fn signed_age_across_wrap() {
        let a = Register::new(0x0000_0010);
        let b = Register::new(0xFFFF_FFF0);
        assert_eq!(a.subtract(b).to_signed_int(), 32);
        assert!(b.wrapping_lt(a));
        assert!(!a.wrapping_lt(b));
    }

    #[test]
    fn multiply_truncates_toward_zero() {
        assert_eq!(Register::new(10).multiply(1.55).to_u32(), 15);
        assert_eq!(Register::new(3).multiply(0.5).to_u32(), 1);
    }

    #[test]
    fn add_signed_negative_goes_backwards() {
        assert_eq!(Register::new(3).add_signed(-5).to_u32(), u32::MAX - 1);
    }

    #[test]
    fn stale_detection_uses_half_range() {
        let now = Register::new(HALF_RANGE);
        assert!(now.is_stale_relative_to(Register::ZERO));
        assert!(!Register::new(HALF_RANGE - 1).is_stale_relative_to(Register::ZERO));
    }
}
