pub mod config;
pub mod manager;

pub use config::{HealthPolicy, HeartbeatPolicy, PeerPolicy, TimeoutPolicy};
pub use manager::{PeerManager, PeerSnapshot, PeerState};
