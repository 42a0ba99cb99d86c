pub mod config;
pub mod heartbeat;
pub mod peer;
pub mod replicator;
pub mod types;

pub use config::{NodeConfig, PeerConfig, TuningConfig};
pub use heartbeat::HeartbeatWorker;
pub use peer::{PeerClient, SendError};
pub use replicator::Replicator;
pub use types::{Payload, ReplicationStatus};
