//! Environment overrides live in their own test binary: they mutate the
//! process environment, which every loader in the process would observe.

mod common;

use common::tests_data_dir;
use wsnsim::clock::ClockConfig;
use wsnsim::SimConfig;

#[test]
fn clock_overrides_use_one_variable_name_for_every_loader() {
    std::env::set_var("WSNSIM_CLOCK__DRIFT_DEVIATION_PPM", "7.5");

    let flat = tests_data_dir().join("clock-config");
    let flat = ClockConfig::from_file(flat.to_str().unwrap()).expect("load flat config");
    assert_eq!(flat.drift_deviation_ppm, 7.5);
    assert_eq!(flat.mean_drift_ppm, 25.0);

    let full = tests_data_dir().join("sim-config");
    let section = ClockConfig::from_file(full.to_str().unwrap()).expect("load clock section");
    assert_eq!(section.drift_deviation_ppm, 7.5);
    assert_eq!(section.mean_drift_ppm, 10.0);

    let sim = SimConfig::from_file(full.to_str().unwrap()).expect("load simulation config");
    assert_eq!(sim.clock, section);

    std::env::remove_var("WSNSIM_CLOCK__DRIFT_DEVIATION_PPM");
}
