//! Rule-based summary of node health built from the metrics registry and the
//! recent log buffer.

pub mod report;
pub mod rules;

pub use report::{HealthReport, HealthStatus};
pub use rules::{Finding, Rule};

use crate::logs::{LogBuffer, LogLevel};
use crate::metrics::Metrics;
use std::sync::Arc;

/// How many recent log lines the log-based signals look at.
const LOG_WINDOW: usize = 100;
/// WARN lines mentioning a failed replication before the node is degraded.
const REPLICATION_FAILURE_LOG_THRESHOLD: usize = 3;

pub struct HealthAnalyzer {
    metrics: Arc<Metrics>,
    logs: Arc<LogBuffer>,
    rules: Vec<Rule>,
}

impl HealthAnalyzer {
    pub fn new(metrics: Arc<Metrics>, logs: Arc<LogBuffer>) -> Self {
        Self {
            metrics,
            logs,
            rules: rules::DEFAULT_RULES.to_vec(),
        }
    }

    pub fn analyze(&self) -> HealthReport {
        let snapshot = self.metrics.snapshot();

        let mut status = HealthStatus::Ok;
        let mut signals = Vec::new();
        let mut recommendations = Vec::new();

        for finding in self.rules.iter().filter_map(|rule| rule(&snapshot)) {
            signals.push(finding.signal.to_string());
            recommendations.push(finding.recommendation.to_string());
            status = status.escalate(finding.severity);
        }

        let lines = self.logs.recent(LOG_WINDOW);
        let replication_failures = lines
            .iter()
            .filter(|l| l.level == LogLevel::Warn && l.message.contains("replication failed"))
            .count();
        let panics = lines
            .iter()
            .filter(|l| l.level == LogLevel::Error && l.message.contains("panic"))
            .count();

        if replication_failures >= REPLICATION_FAILURE_LOG_THRESHOLD {
            signals.push("Repeated replication failures detected in logs".to_string());
            recommendations.push("Investigate network connectivity or peer health".to_string());
            status = status.escalate(HealthStatus::Degraded);
        }

        if panics > 0 {
            signals.push("Application panics detected in logs".to_string());
            recommendations.push("Inspect stack traces and stabilize error handling".to_string());
            status = status.escalate(HealthStatus::Critical);
        }

        let summary = if status == HealthStatus::Ok {
            "System is healthy"
        } else {
            "System health issues detected"
        };

        HealthReport {
            overall_status: status,
            summary: summary.to_string(),
            signals,
            recommendations,
        }
    }
}
