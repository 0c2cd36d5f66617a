use log::*;
use wsnsim::sync::{NodeId, TimeSync};
use wsnsim::{SimConfig, SimResult, Simulation};

use crate::data_collection::RunData;

/// Builds the configured topology, runs it to the horizon and records a
/// status line per node per log interval.
pub struct Scenario {
    simulation: Simulation,
    run_data: RunData,
}

impl Scenario {
    pub fn new(config: SimConfig) -> SimResult<Self> {
        let run = config.simulation.clone();
        let mut simulation = Simulation::new(config)?;

        let positions = run.layout.positions(run.node_count, run.spacing);
        if positions.len() < run.node_count {
            warn!(
                "{:?} layout fits {} of {} nodes",
                run.layout,
                positions.len(),
                run.node_count
            );
        }
        for (i, position) in positions.into_iter().enumerate() {
            simulation.create_node(run.protocol, i as NodeId + 1, position)?;
        }

        Ok(Scenario {
            simulation,
            run_data: RunData::new(),
        })
    }

    pub fn run(&mut self) -> SimResult<()> {
        let ids: Vec<NodeId> = self.simulation.nodes().iter().map(|n| n.id()).collect();
        for id in ids {
            if let Err(e) = self.simulation.turn_on(id) {
                warn!("node {id} left off: {e}");
            }
        }

        let run = self.simulation.config().simulation.clone();
        let horizon = run.duration_ticks();
        let interval = run.log_interval_ticks();
        info!(
            "Running {} {:?} nodes for {} s",
            self.simulation.nodes().len(),
            run.protocol,
            run.duration_secs
        );

        let mut next_log = interval;
        while next_log <= horizon {
            self.simulation.run_until(next_log);
            for line in self.simulation.status_lines() {
                debug!("{line}");
            }
            self.run_data.record_statuses(self.simulation.statuses());
            next_log += interval;
        }
        self.simulation.run_until(horizon);

        for node in self.simulation.nodes() {
            let protocol = node.protocol();
            self.run_data
                .record_node(node.id(), protocol.is_synced(), protocol.root_id(), node.stats());
        }
        self.simulation.shutdown();

        info!(
            "Run finished: collected {} status records",
            self.run_data.status_count()
        );
        self.save_results()
    }

    fn save_results(&self) -> SimResult<()> {
        let config = self.simulation.config();
        self.run_data.save_summary(
            config,
            self.simulation.current_tick(),
            self.simulation.channel().stats(),
        )?;
        self.run_data.to_csv(&config.simulation.output_filepath)
    }
}
