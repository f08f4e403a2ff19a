//! CSV-backed store
//!
//! Two flat tables on disk:
//!
//! - configs: `domain, expected_ip, status`
//! - checks:  `domain, expected_ip, actual_ips (JSON array text), is_valid,
//!   error, timestamp (RFC3339), duration (ms, 3 decimals)`
//!
//! Checks are append-only; configs are rewritten whole on change. Reads are
//! forgiving: malformed rows fall back to defaults instead of failing the
//! whole table.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{DomainCheck, DomainConfig};

use super::backend::CheckStore;
use super::error::{StorageError, StorageResult};

const CONFIG_HEADERS: [&str; 3] = ["domain", "expected_ip", "status"];
const CHECK_HEADERS: [&str; 7] = [
    "domain",
    "expected_ip",
    "actual_ips",
    "is_valid",
    "error",
    "timestamp",
    "duration",
];

/// Store backed by two CSV files.
pub struct CsvStore {
    configs_path: PathBuf,
    checks_path: PathBuf,
    /// Guards file access; writers exclude readers and each other.
    lock: RwLock<()>,
}

impl CsvStore {
    /// Open the store, creating both tables with headers when missing.
    pub fn open(
        configs_path: impl AsRef<Path>,
        checks_path: impl AsRef<Path>,
    ) -> StorageResult<Self> {
        let store = Self {
            configs_path: configs_path.as_ref().to_path_buf(),
            checks_path: checks_path.as_ref().to_path_buf(),
            lock: RwLock::new(()),
        };

        if !store.configs_path.exists() {
            debug!(path = %store.configs_path.display(), "creating configs table");
            let mut writer = csv::Writer::from_path(&store.configs_path)?;
            writer.write_record(CONFIG_HEADERS)?;
            writer.flush()?;
        }

        if !store.checks_path.exists() {
            debug!(path = %store.checks_path.display(), "creating checks table");
            let mut writer = csv::Writer::from_path(&store.checks_path)?;
            writer.write_record(CHECK_HEADERS)?;
            writer.flush()?;
        }

        Ok(store)
    }

    fn read_configs_unlocked(&self) -> StorageResult<Vec<DomainConfig>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.configs_path)?;

        let mut configs = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() < 2 {
                continue;
            }

            configs.push(DomainConfig {
                domain: record[0].to_string(),
                expected_ip: record[1].to_string(),
                enabled: record.get(2).is_some_and(|status| status == "true"),
            });
        }

        Ok(configs)
    }

    fn write_configs_unlocked(&self, configs: &[DomainConfig]) -> StorageResult<()> {
        let mut writer = csv::Writer::from_path(&self.configs_path)?;
        writer.write_record(CONFIG_HEADERS)?;

        for config in configs {
            writer.write_record([
                config.domain.as_str(),
                config.expected_ip.as_str(),
                if config.enabled { "true" } else { "false" },
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    fn read_checks_unlocked(&self) -> StorageResult<Vec<DomainCheck>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.checks_path)?;

        let mut checks = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() < 7 {
                continue;
            }

            let resolved_ips = parse_ip_list(&record[2]);
            let valid = record[3].parse().unwrap_or(false);
            let error = (!record[4].is_empty()).then(|| record[4].to_string());
            let timestamp = DateTime::parse_from_rfc3339(&record[5])
                .map(|ts| ts.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            let duration_ms = record[6].parse().unwrap_or(0.0);

            checks.push(DomainCheck {
                domain: record[0].to_string(),
                expected_ip: record[1].to_string(),
                resolved_ips,
                valid,
                error,
                timestamp,
                duration_ms,
                request_time_ms: 0.0,
            });
        }

        Ok(checks)
    }
}

/// IPs are stored as a JSON array inside one CSV field. Older rows may hold
/// a bare address instead.
fn parse_ip_list(field: &str) -> Vec<String> {
    match serde_json::from_str(field) {
        Ok(ips) => ips,
        Err(_) if field.is_empty() || field == "[]" => Vec::new(),
        Err(_) => vec![field.to_string()],
    }
}

#[async_trait]
impl CheckStore for CsvStore {
    async fn get_domain_configs(&self) -> StorageResult<Vec<DomainConfig>> {
        let _guard = self.lock.read().await;
        self.read_configs_unlocked()
    }

    async fn add_domain_config(&self, config: DomainConfig) -> StorageResult<()> {
        let _guard = self.lock.write().await;

        let mut configs = self.read_configs_unlocked()?;
        if configs.iter().any(|existing| existing.domain == config.domain) {
            return Err(StorageError::DuplicateDomain(config.domain));
        }

        configs.push(config);
        self.write_configs_unlocked(&configs)
    }

    async fn remove_domain_config(&self, domain: &str) -> StorageResult<()> {
        let _guard = self.lock.write().await;

        let configs = self.read_configs_unlocked()?;
        let before = configs.len();
        let remaining: Vec<DomainConfig> = configs
            .into_iter()
            .filter(|config| config.domain != domain)
            .collect();

        if remaining.len() == before {
            return Err(StorageError::DomainNotFound(domain.to_string()));
        }

        self.write_configs_unlocked(&remaining)
    }

    async fn save_check(&self, check: &DomainCheck) -> StorageResult<()> {
        let _guard = self.lock.write().await;

        let file = OpenOptions::new().append(true).open(&self.checks_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let resolved_ips = serde_json::to_string(&check.resolved_ips)
            .map_err(|err| StorageError::Parse(err.to_string()))?;

        writer.write_record([
            check.domain.as_str(),
            check.expected_ip.as_str(),
            resolved_ips.as_str(),
            if check.valid { "true" } else { "false" },
            check.error.as_deref().unwrap_or(""),
            check.timestamp.to_rfc3339().as_str(),
            format!("{:.3}", check.duration_ms).as_str(),
        ])?;

        writer.flush()?;
        Ok(())
    }

    async fn get_checks(&self) -> StorageResult<Vec<DomainCheck>> {
        let _guard = self.lock.read().await;
        self.read_checks_unlocked()
    }

    async fn get_checks_by_domain(&self, domain: &str) -> StorageResult<Vec<DomainCheck>> {
        let _guard = self.lock.read().await;
        let checks = self.read_checks_unlocked()?;
        Ok(checks
            .into_iter()
            .filter(|check| check.domain == domain)
            .collect())
    }
}
