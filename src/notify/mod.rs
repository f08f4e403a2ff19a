//! Start/stop notifications for monitoring transitions.
//!
//! The supervisor fires these from a detached task; a failure is reported
//! back as an alert and never retried.

pub mod email;
pub mod templates;

pub use email::SmtpNotifier;

use anyhow::Result;
use async_trait::async_trait;

use crate::MonitoringStatus;

/// Sink for monitoring lifecycle notifications.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn send_monitoring_notification(
        &self,
        recipients: &[String],
        status: &MonitoringStatus,
    ) -> Result<()>;
}
