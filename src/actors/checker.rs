//! Domain checker actor - runs one domain's DNS health checks
//!
//! Each monitored domain gets its own checker task. The actor resolves the
//! domain, validates the answer against the expected IP, persists the
//! outcome, refreshes its cached stats snapshot and reports upward.
//!
//! ## Message Flow
//!
//! ```text
//! Check command → resolve → validate → persist → refresh snapshot
//!                                   ├─► report DomainChecked (supervisor)
//!                                   ├─► report Alert on invalid result
//!                                   └─► broadcast refreshed stats (bus)
//! ```
//!
//! The inbox serializes checks for one domain; the snapshot lives behind its
//! own lock so queries return without touching storage.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, error, instrument, trace, warn};

use crate::events::{EVENT_DOMAIN_STATS, Event, EventBus};
use crate::resolver::Resolve;
use crate::storage::CheckStore;
use crate::{AlertLevel, DomainCheck, DomainConfig, DomainStats};

use super::messages::{CheckerCommand, CheckerReport, MonitorCommand};

/// Size of a checker's inbox. Ticks are dropped rather than queued when a
/// checker falls this far behind.
const CHECKER_INBOX: usize = 64;

/// Actor that checks a single domain.
pub struct DomainCheckerActor {
    config: DomainConfig,
    resolver: Arc<dyn Resolve>,
    store: Arc<dyn CheckStore>,
    bus: EventBus,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<CheckerCommand>,

    /// Reports back into the supervisor's inbox
    report_tx: mpsc::Sender<MonitorCommand>,

    /// Cached stats snapshot; written after each check, read by queries.
    stats: Arc<RwLock<Option<DomainStats>>>,
}

impl DomainCheckerActor {
    fn new(
        config: DomainConfig,
        resolver: Arc<dyn Resolve>,
        store: Arc<dyn CheckStore>,
        bus: EventBus,
        command_rx: mpsc::Receiver<CheckerCommand>,
        report_tx: mpsc::Sender<MonitorCommand>,
    ) -> Self {
        Self {
            config,
            resolver,
            store,
            bus,
            command_rx,
            report_tx,
            stats: Arc::new(RwLock::new(None)),
        }
    }

    /// Run the actor's main loop.
    ///
    /// Eagerly computes an initial snapshot from persisted history so a
    /// query before the first check still sees historical data.
    #[instrument(skip(self), fields(domain = %self.config.domain))]
    pub async fn run(mut self) {
        debug!("starting domain checker");
        self.refresh_stats().await;

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CheckerCommand::Check => {
                    self.check_domain().await;
                }

                CheckerCommand::GetCachedStats { respond_to } => {
                    let snapshot = self.stats.read().await.clone();
                    let _ = respond_to.send(snapshot);
                }

                CheckerCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        debug!("domain checker stopped");
    }

    /// Execute one check: resolve, validate, persist, refresh, report.
    ///
    /// Resolver and storage failures never crash the checker; the result is
    /// still reported upward even if it could not be saved.
    #[instrument(skip(self), fields(domain = %self.config.domain))]
    async fn check_domain(&mut self) {
        trace!("checking domain");
        let started_at = Utc::now();
        let timer = Instant::now();

        let mut check = DomainCheck {
            domain: self.config.domain.clone(),
            expected_ip: self.config.expected_ip.clone(),
            resolved_ips: Vec::new(),
            valid: false,
            error: None,
            timestamp: started_at,
            duration_ms: 0.0,
            request_time_ms: 0.0,
        };

        let resolution = self.resolver.resolve_ips(&self.config.domain).await;
        let resolution_ms = timer.elapsed().as_secs_f64() * 1000.0;

        match resolution {
            Ok(ips) => {
                check.valid = ips.iter().any(|ip| *ip == self.config.expected_ip);
                check.resolved_ips = ips;
            }
            Err(err) => {
                check.error = Some(format!("{err:#}"));
            }
        }

        check.duration_ms = timer.elapsed().as_secs_f64() * 1000.0;
        trace!(resolution_ms, total_ms = check.duration_ms, "check timed");

        if let Err(err) = self.store.save_check(&check).await {
            warn!("failed to persist check: {err}");
        }

        self.refresh_stats().await;

        let _ = self
            .report_tx
            .send(MonitorCommand::Report(CheckerReport::DomainChecked {
                check: check.clone(),
            }))
            .await;

        if !check.valid {
            let message = format!(
                "domain {} returned unexpected IPs. expected: {}, got: {:?} ({:.2}ms)",
                self.config.domain, self.config.expected_ip, check.resolved_ips, check.duration_ms
            );
            let _ = self
                .report_tx
                .send(MonitorCommand::Report(CheckerReport::Alert {
                    level: AlertLevel::Warning,
                    message,
                }))
                .await;
        }

        self.notify_stats().await;
    }

    /// Recompute the snapshot from stored history and replace the cache.
    async fn refresh_stats(&self) {
        match self.store.get_domain_stats(&self.config.domain).await {
            Ok(Some(stats)) => {
                *self.stats.write().await = Some(stats);
            }
            Ok(None) => {
                trace!("no recorded checks yet");
            }
            Err(err) => {
                error!("failed to compute domain stats: {err}");
            }
        }
    }

    /// Re-broadcast the fresh snapshot on the event bus.
    async fn notify_stats(&self) {
        let snapshot = self.stats.read().await.clone();
        let Some(stats) = snapshot else {
            warn!("no stats available in cache yet");
            return;
        };

        match serde_json::to_value(&stats) {
            Ok(value) => {
                self.bus
                    .broadcast(Event::new(EVENT_DOMAIN_STATS, serde_json::json!({ "stats": value })));
            }
            Err(err) => {
                error!("failed to serialize stats snapshot: {err}");
            }
        }
    }
}

/// Handle for controlling a domain checker.
///
/// Cloneable; shared between the supervisor and its gather tasks.
#[derive(Clone)]
pub struct CheckerHandle {
    sender: mpsc::Sender<CheckerCommand>,

    /// Domain this checker owns
    pub domain: String,
}

impl CheckerHandle {
    /// Spawn a new checker actor and return its handle.
    pub fn spawn(
        config: DomainConfig,
        resolver: Arc<dyn Resolve>,
        store: Arc<dyn CheckStore>,
        bus: EventBus,
        report_tx: mpsc::Sender<MonitorCommand>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(CHECKER_INBOX);
        let domain = config.domain.clone();

        let actor = DomainCheckerActor::new(config, resolver, store, bus, cmd_rx, report_tx);
        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            domain,
        }
    }

    /// Fire-and-forget check trigger. A full inbox drops the tick instead of
    /// stalling the caller.
    pub fn trigger_check(&self) {
        if self.sender.try_send(CheckerCommand::Check).is_err() {
            warn!(domain = %self.domain, "checker inbox full, tick skipped");
        }
    }

    /// Request a copy of the cached snapshot.
    ///
    /// `None` when no check has completed yet or the checker is gone.
    /// Callers bound this with their own timeout; a busy checker answers
    /// only after its current check finishes.
    pub async fn cached_stats(&self) -> Option<DomainStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CheckerCommand::GetCachedStats { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok().flatten()
    }

    /// Gracefully shut down the checker.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(CheckerCommand::Shutdown).await;
    }
}
