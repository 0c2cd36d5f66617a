use wsnsim::sync::adaptive::TrackerSync;
use wsnsim::sync::ftsp::Ftsp;
use wsnsim::sync::gradient::GradientSync;
use wsnsim::sync::median::MedianFtsp;
use wsnsim::sync::pi::PiSync;
use wsnsim::sync::rate::RateFlooding;
use wsnsim::sync::{Beacon, NodeId, SyncConfig, SyncContext, TimeSync};
use wsnsim::Register;

const SECOND: u32 = 1_000_000;

fn ctx(node_id: NodeId, local: u32) -> SyncContext {
    SyncContext {
        node_id,
        local_time: Register::new(local),
        drift: 0.0,
    }
}

fn from_root(sequence: u32, clock: u32) -> Beacon {
    Beacon::new(1, 1, sequence, Register::new(clock))
}

/// Feeds one beacon from root 1 per second in `seqs`, advertising
/// `local + offset(k)` at local time `k` seconds.
fn feed<S: TimeSync>(
    node: &mut S,
    id: NodeId,
    seqs: std::ops::RangeInclusive<u32>,
    offset: impl Fn(u32) -> u32,
) {
    for k in seqs {
        let local = k * SECOND;
        let beacon = from_root(k, local + offset(k));
        node.on_beacon_received(&ctx(id, local), &beacon, Register::new(local));
    }
}

#[test]
fn follower_waits_for_enough_samples_before_sending() {
    let mut node = Ftsp::new(5, &SyncConfig::default());
    feed(&mut node, 5, 1..=2, |_| 1_000);
    assert_eq!(node.root_id(), Some(1));
    assert!(node.on_beacon_due(&ctx(5, 3 * SECOND)).is_none());

    feed(&mut node, 5, 3..=3, |_| 1_000);
    let beacon = node
        .on_beacon_due(&ctx(5, 4 * SECOND))
        .expect("three samples are enough to send");
    assert_eq!(beacon.root_id, 1);
    assert_eq!(beacon.sequence, 3);
    assert_eq!(beacon.clock, Register::new(4 * SECOND + 1_000));
}

#[test]
fn lonely_node_claims_root_after_timeout() {
    let config = SyncConfig::default();
    let mut node = Ftsp::new(9, &config);
    for k in 1..config.root_timeout {
        assert!(node.on_beacon_due(&ctx(9, k * SECOND)).is_none());
    }
    let beacon = node
        .on_beacon_due(&ctx(9, config.root_timeout * SECOND))
        .expect("root advertises");
    assert_eq!(beacon.root_id, 9);
    assert_eq!(beacon.sequence, 0);
    assert_eq!(node.sequence(), 1);
    assert!(node.is_synced());
}

#[test]
fn repeated_outliers_clear_the_table() {
    let mut node = Ftsp::new(5, &SyncConfig::default());
    feed(&mut node, 5, 1..=5, |_| 1_000);
    assert!(node.is_synced());
    assert_eq!(node.num_entries(), 5);

    // far beyond the throwout bound
    for (i, k) in (6..=8).enumerate() {
        assert!(node.is_synced(), "still synced before outlier {}", i + 1);
        feed(&mut node, 5, k..=k, |_| 1_000 + 5_000_000);
    }
    assert!(!node.is_synced());
    assert_eq!(node.num_entries(), 0);
    assert!(node.table().is_empty());

    // and the next sane beacon is accepted again
    feed(&mut node, 5, 9..=9, |_| 1_000);
    assert_eq!(node.num_entries(), 1);
}

#[test]
fn smaller_root_resets_the_table() {
    let mut node = Ftsp::new(5, &SyncConfig::default());
    feed(&mut node, 5, 1..=4, |_| 1_000);
    assert_eq!(node.num_entries(), 4);

    let local = 5 * SECOND;
    let beacon = Beacon::new(2, 0, 0, Register::new(local));
    node.on_beacon_received(&ctx(5, local), &beacon, Register::new(local));
    assert_eq!(node.root_id(), Some(0));
    assert_eq!(node.num_entries(), 1);

    // the old root's advertisements no longer count
    feed(&mut node, 5, 6..=6, |_| 1_000);
    assert_eq!(node.num_entries(), 1);
}

#[test]
fn median_filter_ignores_a_single_bent_fit() {
    let mut node = MedianFtsp::new(5, &SyncConfig::default());
    // offset grows 10 ticks per second: slope 1e-5
    feed(&mut node, 5, 1..=6, |k| 1_000 + 10 * k);
    let steady = node.current().slope();
    assert!((steady - 1e-5).abs() < 1e-9, "steady slope {steady}");

    feed(&mut node, 5, 7..=7, |k| 4_000 + 10 * k);
    assert!(node.inner().fit().slope() > 2e-5);
    assert!((node.current().slope() - 1e-5).abs() < 1e-9);
    let rate = node.rate_estimate(&ctx(5, 7 * SECOND));
    assert_eq!(rate, node.current().slope() as f32);
}

#[test]
fn pi_snaps_outside_the_window_and_integrates_inside() {
    let mut node = PiSync::new(2, &SyncConfig::default());
    assert!((node.boundary() - 6_000.0).abs() < 0.01);

    let r1 = SECOND;
    node.on_beacon_received(&ctx(2, r1), &from_root(1, r1 + 100_000), Register::new(r1));
    assert_eq!(node.local_to_global(Register::new(r1)), Register::new(r1 + 100_000));
    assert_eq!(node.logical_clock().rate(), 0.0);

    let r2 = 2 * SECOND;
    node.on_beacon_received(&ctx(2, r2), &from_root(2, r2 + 100_050), Register::new(r2));
    assert_eq!(node.local_to_global(Register::new(r2)), Register::new(r2 + 100_050));
    let rate = node.logical_clock().rate();
    assert!(rate > 0.0 && rate < 1e-6, "rate {rate}");
    assert_eq!(node.root_id(), Some(1));
}

#[test]
fn pi_root_advertises_its_hardware_clock() {
    let mut node = PiSync::new(1, &SyncConfig::default());
    let beacon = node.on_beacon_due(&ctx(1, 777)).expect("always sends");
    assert_eq!(beacon.clock, Register::new(777));
    assert_eq!(beacon.root_id, 1);
    assert_eq!(node.sequence(), 1);
}

#[test]
fn gradient_step_follows_skew_per_elapsed_tick() {
    let mut node = GradientSync::new(2, &SyncConfig::default());
    assert!((node.boundary() - 6_000.0).abs() < 0.01);
    assert!(!node.is_synced());

    let r1 = SECOND;
    node.on_beacon_received(&ctx(2, r1), &from_root(1, r1 + 100_000), Register::new(r1));
    assert_eq!(node.local_to_global(Register::new(r1)), Register::new(r1 + 100_000));
    assert_eq!(node.logical_clock().rate(), 0.0);
    assert!(node.is_synced());

    // 50 ticks behind after one second: rate moves by 0.1 * 50 / 1e6
    let r2 = 2 * SECOND;
    node.on_beacon_received(&ctx(2, r2), &from_root(2, r2 + 100_050), Register::new(r2));
    assert_eq!(node.local_to_global(Register::new(r2)), Register::new(r2 + 100_050));
    let rate = node.logical_clock().rate();
    assert!((rate - 5e-6).abs() < 1e-9, "rate {rate}");

    // a jump past the window snaps and forgets the learned rate
    let r3 = 3 * SECOND;
    node.on_beacon_received(&ctx(2, r3), &from_root(3, r3 + 120_000), Register::new(r3));
    assert_eq!(node.local_to_global(Register::new(r3)), Register::new(r3 + 120_000));
    assert_eq!(node.logical_clock().rate(), 0.0);
    assert_eq!(node.sequence(), 3);
}

#[test]
fn tracker_slows_down_a_fast_clock() {
    let mut node = TrackerSync::new(2, &SyncConfig::default());
    let r1 = 10 * SECOND;
    // our clock reads 500 ticks ahead of the advertised time
    node.on_beacon_received(&ctx(2, r1), &from_root(1, r1 - 500), Register::new(r1));
    assert_eq!(node.local_to_global(Register::new(r1)), Register::new(r1 - 500));
    assert_eq!(node.rate().value(), -1e-6);

    let r2 = 11 * SECOND;
    node.on_beacon_received(&ctx(2, r2), &from_root(2, r2 - 500), Register::new(r2));
    // within tolerance: step shrinks, value stays
    assert_eq!(node.rate().value(), -1e-6);
    assert_eq!(node.rate().delta(), 5e-7);
}

#[test]
fn rate_flooding_multiplies_relative_rates() {
    let mut node = RateFlooding::new(3, &SyncConfig::default());
    for k in 1..=3u32 {
        let receipt = k * SECOND;
        // node 2 runs 1000 ppm faster than us and reports a 500 ppm root rate
        let mut beacon = Beacon::new(2, 1, k, Register::new(2 * SECOND + k * 1_001_000));
        beacon.root_clock = Register::new(50 * SECOND + k * SECOND);
        beacon.rate = 0.0005;
        node.on_beacon_received(&ctx(3, receipt), &beacon, Register::new(receipt));
    }

    let neighbor_rate = node.neighbors().rate_of(2).expect("neighbor known");
    assert!((neighbor_rate - 0.001).abs() < 1e-6);
    let expected = 1.001f32 * 1.0005 - 1.0;
    assert!((node.root_rate() - expected).abs() < 1e-6);

    let anchor = 53 * SECOND;
    assert_eq!(
        node.local_to_global(Register::new(3 * SECOND + 10_000)),
        Register::new(anchor + 10_015)
    );
    assert!(node.is_synced());
}

#[test]
fn rate_flooding_root_carries_its_clock_forward() {
    let mut node = RateFlooding::new(1, &SyncConfig::default());
    let first = node.on_beacon_due(&ctx(1, 400)).expect("root sends");
    assert_eq!(first.root_clock, Register::new(400));
    let second = node.on_beacon_due(&ctx(1, 900)).expect("root sends");
    assert_eq!(second.root_clock, Register::new(900));
    assert_eq!(second.sequence, 1);
}
