//! Least-squares synchronization smoothed by the median of recent slopes.
//!
//! Beacons are handled exactly as in [`Ftsp`]; once the node is synchronized
//! each fresh fit's slope enters a small ring and the exposed mapping uses the
//! median slope over the ring, anchored at the latest fit's reference point.

use crate::register::Register;
use crate::sync::ftsp::{EntryOutcome, Ftsp};
use crate::sync::regression::{LinearFit, MAX_ENTRIES};
use crate::sync::{Beacon, NodeId, SyncConfig, SyncContext, TimeSync};

#[derive(Debug, Clone, Default)]
struct SlopeRing {
    slopes: [f32; MAX_ENTRIES],
    next: usize,
    len: usize,
}

impl SlopeRing {
    fn push(&mut self, slope: f32) {
        self.slopes[self.next] = slope;
        self.next = (self.next + 1) % MAX_ENTRIES;
        self.len = (self.len + 1).min(MAX_ENTRIES);
    }

    fn reset(&mut self) {
        self.next = 0;
        self.len = 0;
    }

    fn median(&self) -> Option<f32> {
        if self.len == 0 {
            return None;
        }
        let mut sorted = self.slopes[..self.len].to_vec();
        sorted.sort_by(f32::total_cmp);
        let mid = self.len / 2;
        Some(if self.len % 2 == 1 {
            sorted[mid]
        } else {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        })
    }
}

#[derive(Debug, Clone)]
pub struct MedianFtsp {
    inner: Ftsp,
    ring: SlopeRing,
    current: LinearFit,
}

impl MedianFtsp {
    pub fn new(node_id: NodeId, config: &SyncConfig) -> Self {
        Self {
            inner: Ftsp::new(node_id, config),
            ring: SlopeRing::default(),
            current: LinearFit::default(),
        }
    }

    pub fn inner(&self) -> &Ftsp {
        &self.inner
    }

    /// The smoothed line used for the exposed mapping.
    pub fn current(&self) -> &LinearFit {
        if self.inner.is_root() {
            self.inner.fit()
        } else {
            &self.current
        }
    }

    /// `was_synced` is the state before the entry that produced the fit, so
    /// the entry that completes the table does not enter the ring yet.
    fn adjust_line(&mut self, was_synced: bool) {
        let fit = *self.inner.fit();
        let mut slope = fit.slope();
        if was_synced {
            self.ring.push(fit.slope() as f32);
            if let Some(median) = self.ring.median() {
                slope = median as f64;
            }
        }
        self.current = LinearFit::new(fit.mean_local(), fit.mean_offset(), slope);
    }
}

impl TimeSync for MedianFtsp {
    fn on_beacon_received(&mut self, _ctx: &SyncContext, beacon: &Beacon, receipt: Register) {
        let was_synced = self.inner.is_synced();
        match self.inner.process(beacon, receipt) {
            EntryOutcome::Ignored | EntryOutcome::Rejected => {}
            EntryOutcome::Discarded => self.ring.reset(),
            EntryOutcome::Added { table_reset } => {
                if table_reset {
                    self.ring.reset();
                }
                self.adjust_line(was_synced && !table_reset);
            }
        }
    }

    fn on_beacon_due(&mut self, ctx: &SyncContext) -> Option<Beacon> {
        self.inner.on_beacon_due(ctx)
    }

    fn local_to_global(&self, local: Register) -> Register {
        self.current().calculate_y(local)
    }

    fn rate_estimate(&self, _ctx: &SyncContext) -> f32 {
        self.current().slope() as f32
    }

    fn root_id(&self) -> Option<NodeId> {
        self.inner.root_id()
    }

    fn sequence(&self) -> u32 {
        self.inner.sequence()
    }

    fn is_synced(&self) -> bool {
        self.inner.is_synced()
    }

    fn beacon_jitter(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_and_even_rings() {
        let mut ring = SlopeRing::default();
        assert_eq!(ring.median(), None);
        ring.push(3.0);
        ring.push(1.0);
        ring.push(2.0);
        assert_eq!(ring.median(), Some(2.0));
        ring.push(10.0);
        assert_eq!(ring.median(), Some(2.5));
    }

    #[test]
    fn completing_the_table_does_not_feed_the_ring() {
        let config = SyncConfig::default();
        let mut node = MedianFtsp::new(5, &config);
        for k in 1..=config.entry_valid_limit as u32 + 1 {
            let local = Register::new(k * 1_000_000);
            let ctx = SyncContext {
                node_id: 5,
                local_time: local,
                drift: 0.0,
            };
            let beacon = Beacon::new(1, 1, k, local.add_signed(1_000));
            node.on_beacon_received(&ctx, &beacon, local);
            let expected = (k as usize).saturating_sub(config.entry_valid_limit);
            assert_eq!(node.ring.len, expected, "after beacon {k}");
        }
        assert!(node.is_synced());
    }

    #[test]
    fn ring_keeps_only_latest_slopes() {
        let mut ring = SlopeRing::default();
        for _ in 0..MAX_ENTRIES {
            ring.push(100.0);
        }
        for _ in 0..MAX_ENTRIES / 2 + 1 {
            ring.push(1.0);
        }
        assert_eq!(ring.median(), Some(1.0));
    }
}
