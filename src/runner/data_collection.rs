use std::{fs::File, io::Write};

use chrono::Utc;
use csv::Writer;
use serde::Serialize;
use wsnsim::node::{NodeStats, NodeStatus};
use wsnsim::radio::ChannelStats;
use wsnsim::sync::NodeId;
use wsnsim::{SimConfig, SimResult};

#[derive(Debug, Serialize)]
struct NodeSummary {
    node: NodeId,
    synced: bool,
    root: Option<NodeId>,
    #[serde(flatten)]
    stats: NodeStats,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    started_at: i64,
    finished_at: i64,
    wall_clock_ms: i64,
    simulated_ticks: u64,
    channel: ChannelStats,
    nodes: &'a [NodeSummary],
    config: &'a SimConfig,
}

pub struct RunData {
    /// Wall-clock start, in ms since the epoch
    started_at: i64,
    status_data: Vec<NodeStatus>,
    node_summaries: Vec<NodeSummary>,
}

impl RunData {
    pub fn new() -> Self {
        RunData {
            started_at: Utc::now().timestamp_millis(),
            status_data: Vec::new(),
            node_summaries: Vec::new(),
        }
    }

    pub fn record_statuses(&mut self, statuses: impl IntoIterator<Item = NodeStatus>) {
        self.status_data.extend(statuses);
    }

    pub fn record_node(&mut self, node: NodeId, synced: bool, root: Option<NodeId>, stats: NodeStats) {
        self.node_summaries.push(NodeSummary {
            node,
            synced,
            root,
            stats,
        });
    }

    pub fn status_count(&self) -> usize {
        self.status_data.len()
    }

    pub fn save_summary(
        &self,
        config: &SimConfig,
        simulated_ticks: u64,
        channel: ChannelStats,
    ) -> SimResult<()> {
        let finished_at = Utc::now().timestamp_millis();
        let summary = RunSummary {
            started_at: self.started_at,
            finished_at,
            wall_clock_ms: finished_at - self.started_at,
            simulated_ticks,
            channel,
            nodes: &self.node_summaries,
            config,
        };
        let summary_json = serde_json::to_string_pretty(&summary)?;
        let mut summary_file = File::create(&config.simulation.summary_filepath)?;
        summary_file.write_all(summary_json.as_bytes())?;
        summary_file.flush()?;
        Ok(())
    }

    pub fn to_csv(&self, file_path: &str) -> SimResult<()> {
        let file = File::create(file_path)?;
        let mut writer = Writer::from_writer(file);
        for data in &self.status_data {
            writer.serialize(data)?;
        }
        writer.flush()?;
        Ok(())
    }
}
