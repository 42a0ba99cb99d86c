use kvmesh::{HealthAnalyzer, LogBuffer, Metrics, PeerManager, Store};
use kvmesh_replication::{NodeConfig, Replicator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod admin;
pub mod health;
pub mod internal;
pub mod kv;

pub struct AppState {
    pub node_id: String,
    pub store: Arc<Store>,
    pub peers: Arc<PeerManager>,
    pub metrics: Arc<Metrics>,
    pub analyzer: HealthAnalyzer,
    /// `None` when the node runs without peers.
    pub replicator: Option<Arc<Replicator>>,
    /// Shared by background workers and outbound replication.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire up a node from its configuration: every configured peer starts
    /// out healthy, and a replicator exists only if there are peers.
    pub fn from_config(
        config: &NodeConfig,
        logs: Arc<LogBuffer>,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        let policy = config.tuning.peer_policy();
        let metrics = Metrics::new();
        let store = Arc::new(Store::new(Arc::clone(&metrics)));
        let peers = PeerManager::new(policy.health, Arc::clone(&metrics));

        for addr in config.peer_addresses() {
            peers.add_peer(&addr);
        }

        let replicator = if config.peers.is_empty() {
            None
        } else {
            Some(Replicator::new(
                config.node_id.clone(),
                Arc::clone(&peers),
                &policy,
                Arc::clone(&metrics),
            ))
        };

        Arc::new(Self {
            node_id: config.node_id.clone(),
            store,
            peers,
            analyzer: HealthAnalyzer::new(Arc::clone(&metrics), logs),
            metrics,
            replicator,
            shutdown,
        })
    }
}

pub use admin::{list_keys, list_peers, metrics};
pub use health::health;
pub use internal::{heartbeat, replicate, replication_status};
pub use kv::{delete_key, get_key, missing_key, put_key};
