use std::cmp::Ordering;

use wsnsim::rng::SimRng;
use wsnsim::Register;

#[test]
fn subtract_undoes_add_and_add_commutes() {
    let mut rng = SimRng::new(2024);
    let edges = [0, 1, 0x7FFF_FFFF, 0x8000_0000, u32::MAX - 1, u32::MAX];

    let mut pairs: Vec<(u32, u32)> = Vec::new();
    for &a in &edges {
        for &b in &edges {
            pairs.push((a, b));
        }
    }
    for _ in 0..1_000 {
        pairs.push((rng.next_u32(), rng.next_u32()));
    }

    for (a, b) in pairs {
        let (ra, rb) = (Register::new(a), Register::new(b));
        assert_eq!(ra.add(rb).subtract(rb), ra, "a={a:#x} b={b:#x}");
        assert_eq!(ra.add(rb), rb.add(ra), "a={a:#x} b={b:#x}");
        assert_eq!(ra.subtract(rb), ra.add(rb.twos_complement()));
    }
}

#[test]
fn signed_age_across_the_wrap() {
    let a = Register::new(0x0000_0010);
    let b = Register::new(0xFFFF_FFF0);
    assert_eq!(a.subtract(b).to_signed_int(), 32);
    assert_eq!(b.subtract(a).to_signed_int(), -32);
    assert_eq!(a.age_since(b), 32);
}

#[test]
fn wrapping_order_uses_signed_difference() {
    let before = Register::new(0xFFFF_FFF0);
    let after = Register::new(0x10);
    assert!(before.wrapping_lt(after));
    assert!(!after.wrapping_lt(before));
    assert_eq!(after.wrapping_cmp(after), Ordering::Equal);
    // plain unsigned comparison says the opposite
    assert!(before.to_u32() > after.to_u32());
}

#[test]
fn stale_threshold_is_half_the_range() {
    let base = Register::new(100);
    assert!(!base.add_signed(0x7FFF_FFFE).is_stale_relative_to(base));
    assert!(base.add_signed(0x7FFF_FFFF).is_stale_relative_to(base));
}

#[test]
fn multiply_truncates_toward_zero() {
    assert_eq!(Register::new(10).multiply(0.99), Register::new(9));
    assert_eq!(Register::new(3).multiply(2.5), Register::new(7));
    assert_eq!(Register::new(1_000).multiply(0.0), Register::ZERO);
}

#[test]
fn conversions_keep_low_bits() {
    assert_eq!(Register::from_long(0x1_0000_0005), Register::new(5));
    assert_eq!(Register::from_signed(-1), Register::MAX);
    assert_eq!(Register::MAX.to_signed_int(), -1);
    assert_eq!(Register::MAX.to_long(), u32::MAX as u64);
    assert_eq!(Register::new(42).to_string(), "42");
}
