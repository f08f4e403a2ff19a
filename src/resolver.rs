//! DNS resolution for monitored domains.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use tracing::trace;

/// A unit of DNS work: one domain in, its addresses out.
///
/// No shared state; implementations must be safe to call from any task.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolve a domain name into a list of IP strings.
    ///
    /// The error text is preserved verbatim in the recorded check.
    async fn resolve_ips(&self, domain: &str) -> Result<Vec<String>>;
}

/// Production resolver backed by hickory.
pub struct DnsResolver {
    resolver: TokioResolver,
}

impl DnsResolver {
    pub fn new() -> Self {
        let resolver = TokioResolver::builder_with_config(
            ResolverConfig::cloudflare(),
            TokioConnectionProvider::default(),
        )
        .build();

        Self { resolver }
    }
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn resolve_ips(&self, domain: &str) -> Result<Vec<String>> {
        trace!(%domain, "resolving");

        let lookup = self
            .resolver
            .lookup_ip(domain)
            .await
            .with_context(|| format!("DNS resolution failed for {domain}"))?;

        Ok(lookup.iter().map(|ip| ip.to_string()).collect())
    }
}

/// Scripted resolver for tests and offline runs.
///
/// Answers from a fixed table and can delay individual domains to mimic a
/// slow upstream.
#[derive(Debug, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Result<Vec<String>, String>>,
    delays: HashMap<String, Duration>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ips(mut self, domain: &str, ips: &[&str]) -> Self {
        self.entries.insert(
            domain.to_string(),
            Ok(ips.iter().map(|ip| ip.to_string()).collect()),
        );
        self
    }

    pub fn with_error(mut self, domain: &str, error: &str) -> Self {
        self.entries.insert(domain.to_string(), Err(error.to_string()));
        self
    }

    pub fn with_delay(mut self, domain: &str, delay: Duration) -> Self {
        self.delays.insert(domain.to_string(), delay);
        self
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve_ips(&self, domain: &str) -> Result<Vec<String>> {
        if let Some(delay) = self.delays.get(domain) {
            tokio::time::sleep(*delay).await;
        }

        match self.entries.get(domain) {
            Some(Ok(ips)) => Ok(ips.clone()),
            Some(Err(error)) => Err(anyhow!("{error}")),
            None => Err(anyhow!("no address records for {domain}")),
        }
    }
}
