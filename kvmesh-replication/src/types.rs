use kvmesh::Entry;
use serde::{Deserialize, Serialize};

/// One replicated write, as shipped to `POST /internal/replicate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub key: String,
    pub entry: Entry,
    pub original_node_id: String,
}

/// Basic replication status for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationStatus {
    pub node_id: String,
    pub replication_enabled: bool,
    pub peer_count: usize,
}
