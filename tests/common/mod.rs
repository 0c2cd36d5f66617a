#![allow(dead_code)]

use std::path::PathBuf;

use wsnsim::clock::ClockConfig;
use wsnsim::sync::{NodeId, ProtocolKind};
use wsnsim::topology;
use wsnsim::{SimConfig, Simulation};

pub fn tests_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

/// Default configuration with a one-second beacon period.
pub fn fast_config(seed: u64) -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.seed = seed;
    config.sync.beacon_period = 1_000_000;
    config
}

/// Like [`fast_config`] but with ideal clocks, so hops take exactly one period.
pub fn ideal_config(seed: u64) -> SimConfig {
    let mut config = fast_config(seed);
    config.clock = ClockConfig::ideal();
    config
}

/// A simulation of `count` nodes, ids `1..=count`, placed on a line one radio
/// range apart so only consecutive ids hear each other.
pub struct TestHarness {
    pub sim: Simulation,
}

impl TestHarness {
    pub fn line(kind: ProtocolKind, count: usize, config: SimConfig) -> Self {
        let spacing = config.radio.max_distance;
        let mut sim = Simulation::new(config).expect("valid config");
        for (i, position) in topology::line(count, spacing).into_iter().enumerate() {
            sim.create_node(kind, i as NodeId + 1, position)
                .expect("fresh node id");
        }
        Self { sim }
    }

    pub fn turn_on_all(&mut self) {
        let ids: Vec<NodeId> = self.sim.nodes().iter().map(|n| n.id()).collect();
        for id in ids {
            self.sim.turn_on(id).expect("node starts");
        }
    }

    pub fn beacon_period(&self) -> u64 {
        self.sim.config().sync.beacon_period
    }

    /// Runs for `periods` beacon periods past the current tick.
    pub fn run_periods(&mut self, periods: u64) {
        let horizon = self.sim.current_tick() + periods * self.beacon_period();
        self.sim.run_until(horizon);
    }

    /// Status lines sampled every `step` ticks until `horizon`.
    pub fn collect_status(&mut self, step: u64, horizon: u64) -> Vec<String> {
        let mut lines = Vec::new();
        let mut t = step;
        while t <= horizon {
            self.sim.run_until(t);
            lines.extend(self.sim.status_lines());
            t += step;
        }
        lines
    }
}
