use serde::{Deserialize, Serialize};

/// Overall node health, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Critical,
}

impl HealthStatus {
    /// Escalate only; a lower severity never downgrades the current one.
    pub fn escalate(self, other: HealthStatus) -> HealthStatus {
        self.max(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub summary: String,
    pub signals: Vec<String>,
    pub recommendations: Vec<String>,
}
