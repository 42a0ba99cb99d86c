use serde::{Deserialize, Serialize};

/// Body of `PUT /kv/*key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub value: String,
    /// Time to live in milliseconds; absent or non-positive means no expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub value: String,
}
