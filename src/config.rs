use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::trace;

use crate::DomainConfig;

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// CSV tables on disk (default)
    Csv {
        #[serde(default = "default_configs_path")]
        configs_path: PathBuf,

        #[serde(default = "default_checks_path")]
        checks_path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Csv {
            configs_path: default_configs_path(),
            checks_path: default_checks_path(),
        }
    }
}

fn default_configs_path() -> PathBuf {
    PathBuf::from("./domain_configs.csv")
}

fn default_checks_path() -> PathBuf {
    PathBuf::from("./domain_checks.csv")
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    /// Domains seeded into the store at startup.
    pub domains: Option<Vec<DomainConfig>>,

    /// Storage configuration (optional - defaults to CSV tables)
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP API settings
    #[serde(default)]
    pub api: ApiSettings,

    /// SMTP settings; notifications are skipped when absent.
    pub email: Option<EmailSettings>,

    /// Recipients of start/stop notification mails.
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Site control settings
    #[serde(default)]
    pub sites: SitesSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("default bind address is valid")
}

fn default_enable_cors() -> bool {
    true
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EmailSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SitesSettings {
    /// Shell used for site control commands.
    #[serde(default = "default_site_shell")]
    pub shell: String,
}

impl Default for SitesSettings {
    fn default() -> Self {
        Self {
            shell: default_site_shell(),
        }
    }
}

fn default_site_shell() -> String {
    "powershell".to_string()
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
