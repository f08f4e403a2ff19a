//! In-memory store (no persistence)
//!
//! Keeps configs and check history in process memory. Used for tests and
//! deployments that do not care about history surviving a restart.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{DomainCheck, DomainConfig};

use super::backend::CheckStore;
use super::error::{StorageError, StorageResult};

#[derive(Default)]
struct Tables {
    configs: Vec<DomainConfig>,
    checks: Vec<DomainCheck>,
}

/// Store holding everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with domain configs.
    pub fn with_configs(configs: Vec<DomainConfig>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                configs,
                checks: Vec::new(),
            }),
        }
    }

    /// Append history without going through `save_check`.
    pub async fn seed_checks(&self, checks: Vec<DomainCheck>) {
        self.tables.write().await.checks.extend(checks);
    }
}

#[async_trait]
impl CheckStore for MemoryStore {
    async fn get_domain_configs(&self) -> StorageResult<Vec<DomainConfig>> {
        Ok(self.tables.read().await.configs.clone())
    }

    async fn add_domain_config(&self, config: DomainConfig) -> StorageResult<()> {
        let mut tables = self.tables.write().await;

        if tables
            .configs
            .iter()
            .any(|existing| existing.domain == config.domain)
        {
            return Err(StorageError::DuplicateDomain(config.domain));
        }

        tables.configs.push(config);
        Ok(())
    }

    async fn remove_domain_config(&self, domain: &str) -> StorageResult<()> {
        let mut tables = self.tables.write().await;

        let before = tables.configs.len();
        tables.configs.retain(|config| config.domain != domain);

        if tables.configs.len() == before {
            return Err(StorageError::DomainNotFound(domain.to_string()));
        }

        Ok(())
    }

    async fn save_check(&self, check: &DomainCheck) -> StorageResult<()> {
        self.tables.write().await.checks.push(check.clone());
        Ok(())
    }

    async fn get_checks(&self) -> StorageResult<Vec<DomainCheck>> {
        Ok(self.tables.read().await.checks.clone())
    }

    async fn get_checks_by_domain(&self, domain: &str) -> StorageResult<Vec<DomainCheck>> {
        Ok(self
            .tables
            .read()
            .await
            .checks
            .iter()
            .filter(|check| check.domain == domain)
            .cloned()
            .collect())
    }
}
