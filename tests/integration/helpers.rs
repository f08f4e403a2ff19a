//! Test helpers shared by the integration tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use vigil::actors::supervisor::MonitorHandle;
use vigil::events::EventBus;
use vigil::resolver::StaticResolver;
use vigil::storage::MemoryStore;
use vigil::{DomainCheck, DomainConfig};

/// Create a domain config for tests
pub fn domain_config(domain: &str, expected_ip: &str) -> DomainConfig {
    DomainConfig {
        domain: domain.to_string(),
        expected_ip: expected_ip.to_string(),
        enabled: false,
    }
}

/// Create a successful historical check
pub fn valid_check(domain: &str, duration_ms: f64, offset_secs: i64) -> DomainCheck {
    DomainCheck {
        domain: domain.to_string(),
        expected_ip: "1.2.3.4".to_string(),
        resolved_ips: vec!["1.2.3.4".to_string()],
        valid: true,
        error: None,
        timestamp: Utc::now() + Duration::seconds(offset_secs),
        duration_ms,
        request_time_ms: 0.0,
    }
}

/// Spawn a monitor over an in-memory store with the given configs
pub fn spawn_monitor(
    resolver: StaticResolver,
    configs: Vec<DomainConfig>,
) -> (MonitorHandle, EventBus, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_configs(configs));
    let bus = EventBus::new();
    let monitor = MonitorHandle::spawn(
        store.clone(),
        Arc::new(resolver),
        bus.clone(),
        None,
        vec![],
    );
    (monitor, bus, store)
}

/// Resolver answering `1.2.3.4` for every listed domain
pub fn healthy_resolver(domains: &[&str]) -> StaticResolver {
    let mut resolver = StaticResolver::new();
    for domain in domains {
        resolver = resolver.with_ips(domain, &["1.2.3.4"]);
    }
    resolver
}
