//! Message types for actor communication
//!
//! Commands travel to a specific actor over its mpsc inbox; queries carry a
//! oneshot reply channel. Reports flow from checkers (and detached tasks)
//! back into the supervisor's inbox.

use tokio::sync::oneshot;

use crate::{AlertLevel, DomainCheck, DomainStats, MonitoringStatus};

/// Commands accepted by a domain checker.
#[derive(Debug)]
pub enum CheckerCommand {
    /// Run one DNS check now.
    Check,

    /// Return a copy of the cached stats snapshot, if one exists.
    ///
    /// Never performs I/O; the reply is a defensive copy.
    GetCachedStats {
        respond_to: oneshot::Sender<Option<DomainStats>>,
    },

    /// Gracefully shut down the checker.
    Shutdown,
}

/// Reports flowing back into the supervisor.
#[derive(Debug, Clone)]
pub enum CheckerReport {
    /// A check finished (valid or not).
    DomainChecked { check: DomainCheck },

    /// Something needs operator attention.
    Alert { level: AlertLevel, message: String },
}

/// Commands accepted by the monitor supervisor.
#[derive(Debug)]
pub enum MonitorCommand {
    /// Begin periodic monitoring. Idempotent: a second start while running
    /// replies with the current status and changes nothing.
    StartMonitoring {
        interval_secs: u64,
        respond_to: oneshot::Sender<MonitoringStatus>,
    },

    /// Stop periodic monitoring and tear down all checkers. Idempotent.
    StopMonitoring {
        respond_to: oneshot::Sender<MonitoringStatus>,
    },

    /// Trigger a check on every live checker. Sent by the tick loop.
    CheckAllDomains,

    /// Snapshot of the lifecycle state.
    GetStatus {
        respond_to: oneshot::Sender<MonitoringStatus>,
    },

    /// Collect cached stats from all live checkers, bounded in time.
    /// The reply may be partial or empty; skipped checkers are only logged.
    GetAllCachedStats {
        respond_to: oneshot::Sender<Vec<DomainStats>>,
    },

    /// A report from a checker or a background task.
    Report(CheckerReport),

    /// Shut the supervisor down, stopping monitoring first.
    Shutdown,
}
