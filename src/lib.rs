pub mod actors;
pub mod api;
pub mod config;
pub mod events;
pub mod notify;
pub mod resolver;
pub mod sites;
pub mod stats;
pub mod storage;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for a single monitored domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub domain: String,
    pub expected_ip: String,
    /// Status flag carried in the config table.
    #[serde(default)]
    pub enabled: bool,
}

/// Outcome of one DNS resolution and validation attempt.
///
/// Immutable after creation; appended to the check history by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainCheck {
    pub domain: String,
    pub expected_ip: String,
    /// IPs the resolver returned, in resolver order. Empty on resolution failure.
    pub resolved_ips: Vec<String>,
    /// True iff the expected IP is a member of `resolved_ips`.
    pub valid: bool,
    /// Resolver error text, verbatim. `None` when resolution succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the check started.
    pub timestamp: DateTime<Utc>,
    /// Time spent resolving and validating, in milliseconds.
    pub duration_ms: f64,
    /// End-to-end time until the supervisor received the report, in
    /// milliseconds. Measured by the receiver, not the checker.
    #[serde(default)]
    pub request_time_ms: f64,
}

impl DomainCheck {
    /// A check counts as a success when it validated and no resolver error occurred.
    pub fn succeeded(&self) -> bool {
        self.valid && self.error.is_none()
    }
}

/// Cached summary statistics for one domain.
///
/// Recomputed from the full check history after every check; owned by the
/// domain's checker and handed out by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStats {
    pub domain: String,
    pub total_checks: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Percentage of successful checks, rounded to 2 decimals.
    pub success_rate: f64,
    pub average_uptime: f64,
    pub last_check: DateTime<Utc>,
    pub avg_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub p95_response_time: f64,
    /// How many checks carried usable timing data.
    pub checks_with_timing: usize,
}

/// Snapshot of the monitoring lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringStatus {
    pub running: bool,
    pub interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub active_checkers: usize,
    pub message: String,
}

/// Severity of an alert report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Warning,
    Error,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Warning => write!(f, "WARNING"),
            AlertLevel::Error => write!(f, "ERROR"),
        }
    }
}
