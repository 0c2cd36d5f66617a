mod common;

use common::tests_data_dir;
use wsnsim::clock::{Clock, ClockConfig, Timer};
use wsnsim::rng::SimRng;
use wsnsim::scheduler::Scheduler;
use wsnsim::{Register, SimError};

#[test]
fn reference_clock_tracks_scheduler_ticks() {
    let mut rng = SimRng::new(0);
    let mut clock = Clock::reference();
    assert!(clock.is_reference());
    clock.advance(1_000, &mut rng);
    clock.advance(24, &mut rng);
    assert_eq!(clock.value(), Register::new(1_024));
}

#[test]
fn drift_accumulates_sub_tick_fractions() {
    let mut rng = SimRng::new(0);
    let mut clock = Clock::with_drift(0.5, 0.0);
    for _ in 0..10 {
        clock.advance(1, &mut rng);
    }
    assert_eq!(clock.value(), Register::new(15));
}

#[test]
fn drifting_clock_wraps_around() {
    let mut rng = SimRng::new(0);
    let mut clock = Clock::with_drift(0.0, 0.0);
    clock.set_value(Register::new(u32::MAX - 9));
    clock.advance(20, &mut rng);
    assert_eq!(clock.value(), Register::new(10));
}

#[test]
fn drawn_drift_is_fixed_for_the_clock_lifetime() {
    let mut rng = SimRng::new(11);
    let mut clock = Clock::drifting(&ClockConfig::default(), &mut rng);
    let drift = clock.drift();
    for _ in 0..50 {
        clock.advance(1_000, &mut rng);
    }
    assert_eq!(clock.drift(), drift);
    // 50 000 ticks with a drift well under 1%
    let value = clock.value().to_u32();
    assert!((49_000..51_000).contains(&value), "clock at {value}");
}

#[test]
fn timer_conversion_compensates_drift() {
    assert_eq!(Timer::convert(1_000, 0.0), 1_000);
    assert_eq!(Timer::convert(1_000, 1.0), 500);
    assert_eq!(Timer::convert(1_000, -0.5), 2_000);
    assert_eq!(Timer::convert(1, 1.0), 1);
}

#[test]
fn periodic_timer_rearms_with_the_start_period() {
    let mut scheduler = Scheduler::new();
    let mut timer = Timer::new();
    timer
        .start_periodic(10, 0.0, &mut scheduler, "beacon")
        .expect("valid period");
    assert!(timer.is_periodic());

    for round in 1..=3u64 {
        scheduler.advance_by(10);
        let (id, event) = scheduler.pop_due().expect("timer due");
        assert_eq!(event, "beacon");
        assert!(timer.fired(id, &mut scheduler, event));
        assert_eq!(scheduler.next_tick(), Some((round + 1) * 10));
    }
}

#[test]
fn drifting_periodic_timer_rearms_with_the_converted_period() {
    let mut scheduler = Scheduler::new();
    let mut timer = Timer::new();
    // a clock running 50% fast covers 300 local ticks in 200 real ones
    timer
        .start_periodic(300, 0.5, &mut scheduler, "beacon")
        .expect("valid period");
    assert_eq!(timer.nominal(), 300);
    assert_eq!(timer.period(), 200);
    assert_eq!(scheduler.next_tick(), Some(200));

    for round in 1..=3u64 {
        scheduler.advance_by(200);
        let (id, event) = scheduler.pop_due().expect("timer due");
        assert!(timer.fired(id, &mut scheduler, event));
        assert_eq!(scheduler.next_tick(), Some((round + 1) * 200));
    }
    assert_eq!(timer.period(), 200);
}

#[test]
fn oneshot_timer_does_not_rearm() {
    let mut scheduler = Scheduler::new();
    let mut timer = Timer::new();
    timer.start_oneshot(5, 0.0, &mut scheduler, ()).expect("valid period");
    scheduler.advance_by(5);
    let (id, event) = scheduler.pop_due().expect("timer due");
    assert!(timer.fired(id, &mut scheduler, event));
    assert!(!timer.is_running());
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn restart_and_stop_leave_no_stale_events() {
    let mut scheduler = Scheduler::new();
    let mut timer = Timer::new();
    timer.start_periodic(10, 0.0, &mut scheduler, 1).expect("valid period");
    timer.start_oneshot(5, 0.0, &mut scheduler, 2).expect("valid period");
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.next_tick(), Some(5));

    timer.stop(&mut scheduler);
    timer.stop(&mut scheduler);
    assert_eq!(scheduler.pending(), 0);
    assert!(!timer.is_running());
}

#[test]
fn zero_period_is_a_configuration_error() {
    let mut scheduler: Scheduler<()> = Scheduler::new();
    let mut timer = Timer::new();
    let result = timer.start_periodic(0, 0.0, &mut scheduler, ());
    assert!(matches!(result, Err(SimError::InvalidPeriod(0))));
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn clock_config_from_file() {
    let path = tests_data_dir().join("clock-config");
    let config = ClockConfig::from_file(path.to_str().unwrap()).expect("load config");
    assert_eq!(config.mean_drift_ppm, 25.0);
    assert_eq!(config.drift_deviation_ppm, 50.0);
    assert_eq!(config.noise_deviation, 2.0);
    assert!(config.validate().is_ok());
}

#[test]
fn clock_config_reads_section_of_full_config() {
    let path = tests_data_dir().join("sim-config");
    let config = ClockConfig::from_file(path.to_str().unwrap()).expect("load config");
    assert_eq!(config.mean_drift_ppm, 10.0);
    assert_eq!(config.drift_deviation_ppm, 40.0);
    // not set in the file
    assert_eq!(config.noise_deviation, 5.0);
}
