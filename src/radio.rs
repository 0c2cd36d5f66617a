//! Radio propagation and MAC.

pub mod channel;
pub mod config;
pub mod packet;

pub use channel::{Channel, ChannelStats, RadioState, SendOutcome, SenseOutcome, Slot, TransmissionEnd};
pub use config::RadioConfig;
pub use packet::RadioPacket;
