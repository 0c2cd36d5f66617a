pub mod adaptive;
pub mod config;
pub mod election;
pub mod ftsp;
pub mod gradient;
pub mod logical_clock;
pub mod median;
pub mod message;
pub mod neighbor;
pub mod pi;
pub mod rate;
pub mod regression;
pub mod tracker;

pub use config::SyncConfig;
pub use message::Beacon;

use serde::{Deserialize, Serialize};

use crate::register::Register;
use crate::rng::SimRng;

pub type NodeId = u32;

/// Node-local facts a strategy may consult while handling an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncContext {
    pub node_id: NodeId,
    /// Hardware clock reading at the time of the event
    pub local_time: Register,
    /// Hardware clock drift, as a fraction
    pub drift: f64,
}

/// Capability shared by every synchronization strategy.
pub trait TimeSync {
    /// Handles a beacon whose send event happened at receiver-local `receipt`.
    fn on_beacon_received(&mut self, ctx: &SyncContext, beacon: &Beacon, receipt: Register);

    /// Beacon timer fired. Returns the beacon to broadcast, if any.
    fn on_beacon_due(&mut self, ctx: &SyncContext) -> Option<Beacon>;

    fn local_to_global(&self, local: Register) -> Register;

    /// Rate figure reported in status lines.
    fn rate_estimate(&self, ctx: &SyncContext) -> f32;

    fn root_id(&self) -> Option<NodeId>;

    fn sequence(&self) -> u32;

    fn is_synced(&self) -> bool;

    /// Whether the beacon timer gets a random phase offset.
    fn beacon_jitter(&self) -> bool {
        true
    }
}

/// Beacon period shifted by a random multiple of 10 000 ticks between -98 and
/// +100, so flooding nodes do not fire in lockstep.
pub fn jittered_period(period: u64, rng: &mut SimRng) -> u64 {
    let offset = ((rng.next_i32() % 100) + 1) as i64 * 10_000;
    (period as i64 + offset).max(1) as u64
}

macro_rules! register_protocols {
    ($($kind:ident => $type:ty),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ProtocolKind {
            $($kind),*
        }

        impl ProtocolKind {
            pub const ALL: &'static [ProtocolKind] = &[$(ProtocolKind::$kind),*];
        }

        /// A node's synchronization strategy, chosen at construction.
        #[derive(Debug, Clone)]
        pub enum Protocol {
            $($kind($type)),*
        }

        impl Protocol {
            pub fn new(kind: ProtocolKind, node_id: NodeId, config: &SyncConfig) -> Self {
                match kind {
                    $(ProtocolKind::$kind => Protocol::$kind(<$type>::new(node_id, config))),*
                }
            }

            pub fn kind(&self) -> ProtocolKind {
                match self {
                    $(Protocol::$kind(_) => ProtocolKind::$kind),*
                }
            }

            fn strategy(&self) -> &dyn TimeSync {
                match self {
                    $(Protocol::$kind(p) => p),*
                }
            }

            fn strategy_mut(&mut self) -> &mut dyn TimeSync {
                match self {
                    $(Protocol::$kind(p) => p),*
                }
            }
        }
    };
}

register_protocols!(
    Ftsp => ftsp::Ftsp,
    Median => median::MedianFtsp,
    Pi => pi::PiSync,
    Gd => gradient::GradientSync,
    Tracker => adaptive::TrackerSync,
    RateFlooding => rate::RateFlooding,
);

impl ProtocolKind {
    /// PI and gradient nodes power up with a random hardware clock value.
    pub fn random_clock_start(self) -> bool {
        matches!(self, ProtocolKind::Pi | ProtocolKind::Gd)
    }
}

impl TimeSync for Protocol {
    fn on_beacon_received(&mut self, ctx: &SyncContext, beacon: &Beacon, receipt: Register) {
        self.strategy_mut().on_beacon_received(ctx, beacon, receipt)
    }

    fn on_beacon_due(&mut self, ctx: &SyncContext) -> Option<Beacon> {
        self.strategy_mut().on_beacon_due(ctx)
    }

    fn local_to_global(&self, local: Register) -> Register {
        self.strategy().local_to_global(local)
    }

    fn rate_estimate(&self, ctx: &SyncContext) -> f32 {
        self.strategy().rate_estimate(ctx)
    }

    fn root_id(&self) -> Option<NodeId> {
        self.strategy().root_id()
    }

    fn sequence(&self) -> u32 {
        self.strategy().sequence()
    }

    fn is_synced(&self) -> bool {
        self.strategy().is_synced()
    }

    fn beacon_jitter(&self) -> bool {
        self.strategy().beacon_jitter()
    }
}
