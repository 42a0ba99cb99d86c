use kvmesh::{HealthPolicy, HeartbeatPolicy, PeerPolicy, RetryPolicy, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_id: String,
    pub bind_addr: String,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    #[serde(default)]
    pub tuning: TuningConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub node_id: String,
    pub addr: String, // e.g., "http://10.0.1.2:8080" or "http://node-b:8080"
}

/// Timing and threshold knobs. Every field is optional in `node.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub replication_timeout_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub ttl_sweep_interval_ms: u64,
    pub log_buffer_capacity: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 100,
            max_backoff_ms: 2000,
            replication_timeout_ms: 2000,
            heartbeat_timeout_ms: 1000,
            heartbeat_interval_ms: 5000,
            failure_threshold: 3,
            success_threshold: 2,
            ttl_sweep_interval_ms: 5000,
            log_buffer_capacity: 1000,
        }
    }
}

impl TuningConfig {
    /// Intervals are floored at 1 ms; a zero period cannot drive a ticker.
    pub fn peer_policy(&self) -> PeerPolicy {
        PeerPolicy {
            retry: RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.base_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            ),
            timeout: TimeoutPolicy {
                replication: Duration::from_millis(self.replication_timeout_ms),
                heartbeat: Duration::from_millis(self.heartbeat_timeout_ms),
            },
            health: HealthPolicy {
                failure_threshold: self.failure_threshold,
                success_threshold: self.success_threshold,
            },
            heartbeat: HeartbeatPolicy {
                interval: Duration::from_millis(self.heartbeat_interval_ms.max(1)),
            },
        }
    }

    pub fn ttl_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.ttl_sweep_interval_ms.max(1))
    }
}

impl NodeConfig {
    /// Load node configuration from {data_dir}/node.json or return standalone default
    pub fn load_or_default(data_dir: &Path) -> Self {
        let node_json = data_dir.join("node.json");

        if node_json.exists() {
            match std::fs::read_to_string(&node_json) {
                Ok(content) => match serde_json::from_str::<NodeConfig>(&content) {
                    Ok(config) => {
                        tracing::info!(
                            "Loaded node config: node_id={}, peers={}",
                            config.node_id,
                            config.peers.len()
                        );
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse node.json: {}, using defaults", e);
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read node.json: {}, using defaults", e);
                }
            }
        }

        let config = Self::standalone();
        tracing::info!(
            "No usable node.json, running in standalone mode: node_id={}",
            config.node_id
        );
        config
    }

    /// Single node with no peers, identity taken from the environment.
    pub fn standalone() -> Self {
        let node_id = std::env::var("KVMESH_NODE_ID").unwrap_or_else(|_| {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string())
        });

        let bind_addr =
            std::env::var("KVMESH_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        NodeConfig {
            node_id,
            bind_addr,
            peers: vec![],
            tuning: TuningConfig::default(),
        }
    }

    pub fn peer_addresses(&self) -> Vec<String> {
        self.peers.iter().map(|p| p.addr.clone()).collect()
    }
}
