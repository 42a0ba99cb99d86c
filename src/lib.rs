//! # kvmesh
//!
//! A replicated in-memory key-value cache. Each node keeps a local [`Store`]
//! with last-write-wins merges and TTL expiry; writes are fanned out to
//! healthy peers by the replicator in the companion `kvmesh-replication`
//! crate, and peer health is tracked by [`PeerManager`].
//!
//! ## Quick start
//!
//! ```rust
//! use kvmesh::{Entry, Metrics, Store};
//!
//! let store = Store::new(Metrics::new());
//! store.set("greeting", Entry::new("hello", 1));
//! store.set("greeting", Entry::new("stale", 0)); // older timestamp, ignored
//!
//! assert_eq!(store.get("greeting").as_deref(), Some("hello"));
//! ```
//!
//! ## Peer health
//!
//! ```rust
//! use kvmesh::{HealthPolicy, Metrics, PeerManager};
//!
//! let peers = PeerManager::new(HealthPolicy { failure_threshold: 1, success_threshold: 2 }, Metrics::new());
//! peers.add_peer("http://10.0.0.2:8080");
//! peers.mark_failure("http://10.0.0.2:8080");
//! assert!(!peers.is_healthy("http://10.0.0.2:8080"));
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Dependencies | Use case |
//! |---------|-------------|----------|
//! | `axum-support` | axum | [`KvMeshError`] implements `IntoResponse` |

pub mod analyzer;
pub mod error;
pub mod logs;
pub mod metrics;
pub mod peers;
pub mod retry;
pub mod store;
pub mod ttl;
pub mod types;

pub use analyzer::{HealthAnalyzer, HealthReport, HealthStatus};
pub use error::{KvMeshError, Result};
pub use logs::{LogBuffer, LogBufferLayer, LogLevel, LogLine};
pub use metrics::Metrics;
pub use peers::{
    HealthPolicy, HeartbeatPolicy, PeerManager, PeerPolicy, PeerSnapshot, PeerState,
    TimeoutPolicy,
};
pub use retry::{retry, RetryError, RetryPolicy};
pub use store::{ExpirySweep, Store};
pub use ttl::TtlCleaner;
pub use types::Entry;
