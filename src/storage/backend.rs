//! Store trait definition
//!
//! All persistence backends implement [`CheckStore`]. Implementations must
//! be `Send + Sync`; they are shared across actor tasks behind an `Arc`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::stats::compute_domain_stats;
use crate::{DomainCheck, DomainConfig, DomainStats};

use super::error::StorageResult;

/// Persistence contract for domain configs and check history.
#[async_trait]
pub trait CheckStore: Send + Sync {
    /// All configured domains.
    async fn get_domain_configs(&self) -> StorageResult<Vec<DomainConfig>>;

    /// Add a new domain config. Fails with `DuplicateDomain` if one exists.
    async fn add_domain_config(&self, config: DomainConfig) -> StorageResult<()>;

    /// Remove a domain config. Fails with `DomainNotFound` if absent.
    async fn remove_domain_config(&self, domain: &str) -> StorageResult<()>;

    /// Append one check to the history.
    async fn save_check(&self, check: &DomainCheck) -> StorageResult<()>;

    /// Full check history, oldest first.
    async fn get_checks(&self) -> StorageResult<Vec<DomainCheck>>;

    /// Check history for one domain, oldest first.
    async fn get_checks_by_domain(&self, domain: &str) -> StorageResult<Vec<DomainCheck>>;

    /// The `limit` most recent checks, newest first.
    async fn get_recent_checks(&self, limit: usize) -> StorageResult<Vec<DomainCheck>> {
        let mut checks = self.get_checks().await?;
        checks.reverse();
        checks.truncate(limit);
        Ok(checks)
    }

    /// Checks whose timestamp falls within `[start, end]`.
    async fn get_checks_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<DomainCheck>> {
        let checks = self.get_checks().await?;
        Ok(checks
            .into_iter()
            .filter(|check| check.timestamp >= start && check.timestamp <= end)
            .collect())
    }

    /// Statistics over one domain's stored history.
    ///
    /// `None` when no checks have been recorded for the domain yet.
    async fn get_domain_stats(&self, domain: &str) -> StorageResult<Option<DomainStats>> {
        let checks = self.get_checks_by_domain(domain).await?;
        Ok(compute_domain_stats(domain, &checks))
    }
}
