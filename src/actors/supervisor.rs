//! Monitor supervisor actor - owns the monitoring lifecycle
//!
//! The supervisor processes commands serially from its inbox. Its checker
//! registry and run-state live behind one `RwLock`, shared with the tick
//! loop and the stats gather tasks; every read and write goes through that
//! lock.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──StartMonitoring──► Running ──StopMonitoring──► Idle
//!   (spawn checkers,                  (cancel tick loop,
//!    launch tick loop)                 tear down checkers)
//! ```
//!
//! Start and stop are idempotent: repeating either replies with the current
//! status and performs no transition.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::time::{interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::events::{EVENT_MONITORING_IP, Event, EventBus};
use crate::notify::Notify;
use crate::resolver::Resolve;
use crate::storage::CheckStore;
use crate::{AlertLevel, DomainStats, MonitoringStatus};

use super::checker::CheckerHandle;
use super::messages::{CheckerReport, MonitorCommand};

/// Per-checker stats request timeout.
const STATS_REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

/// Upper bound on one whole stats collection pass. The caller is unblocked
/// within this bound no matter how many checkers are slow or dead.
const STATS_COLLECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Supervisor inbox size.
const MONITOR_INBOX: usize = 256;

/// Checker registry and run-state.
///
/// Mutated by the command loop and read by the tick loop and gather tasks;
/// the one lock is the only exclusion mechanism for all of it.
#[derive(Default)]
struct MonitorState {
    running: bool,
    interval: Duration,
    started_at: Option<DateTime<Utc>>,
    checkers: HashMap<String, CheckerHandle>,
}

impl MonitorState {
    fn status(&self, message: impl Into<String>) -> MonitoringStatus {
        MonitoringStatus {
            running: self.running,
            interval_secs: self.interval.as_secs(),
            started_at: if self.running { self.started_at } else { None },
            active_checkers: self.checkers.len(),
            message: message.into(),
        }
    }
}

/// Actor owning the set of domain checkers and the periodic tick loop.
pub struct MonitorActor {
    store: Arc<dyn CheckStore>,
    resolver: Arc<dyn Resolve>,
    bus: EventBus,
    notifier: Option<Arc<dyn Notify>>,
    recipients: Vec<String>,

    state: Arc<RwLock<MonitorState>>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<MonitorCommand>,

    /// Self-sender handed to the tick loop, checkers and notification tasks
    command_tx: mpsc::Sender<MonitorCommand>,

    /// Cancels the tick loop of the current run
    cancel: Option<CancellationToken>,
}

impl MonitorActor {
    fn new(
        store: Arc<dyn CheckStore>,
        resolver: Arc<dyn Resolve>,
        bus: EventBus,
        notifier: Option<Arc<dyn Notify>>,
        recipients: Vec<String>,
        command_rx: mpsc::Receiver<MonitorCommand>,
        command_tx: mpsc::Sender<MonitorCommand>,
    ) -> Self {
        Self {
            store,
            resolver,
            bus,
            notifier,
            recipients,
            state: Arc::new(RwLock::new(MonitorState::default())),
            command_rx,
            command_tx,
            cancel: None,
        }
    }

    /// Run the actor's main loop.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting monitor actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                MonitorCommand::StartMonitoring {
                    interval_secs,
                    respond_to,
                } => {
                    self.handle_start(interval_secs, respond_to).await;
                }

                MonitorCommand::StopMonitoring { respond_to } => {
                    self.handle_stop(Some(respond_to)).await;
                }

                MonitorCommand::CheckAllDomains => {
                    self.trigger_checks().await;
                }

                MonitorCommand::GetStatus { respond_to } => {
                    let state = self.state.read().await;
                    let message = if state.running {
                        format!("Monitoring {} domains", state.checkers.len())
                    } else {
                        "Monitoring stopped".to_string()
                    };
                    let _ = respond_to.send(state.status(message));
                }

                MonitorCommand::GetAllCachedStats { respond_to } => {
                    self.collect_cached_stats(respond_to).await;
                }

                MonitorCommand::Report(report) => {
                    self.handle_report(report).await;
                }

                MonitorCommand::Shutdown => {
                    debug!("received shutdown command");
                    self.handle_stop(None).await;
                    break;
                }
            }
        }

        debug!("monitor actor stopped");
    }

    async fn handle_start(
        &mut self,
        interval_secs: u64,
        respond_to: oneshot::Sender<MonitoringStatus>,
    ) {
        {
            let state = self.state.read().await;
            if state.running {
                warn!(interval_secs = state.interval.as_secs(), "monitoring already started");
                let _ = respond_to.send(state.status("Monitoring already running"));
                return;
            }
        }

        self.spawn_checkers().await;

        let period = Duration::from_secs(interval_secs.max(1));
        let cancel = CancellationToken::new();

        let status = {
            let mut state = self.state.write().await;
            state.running = true;
            state.interval = period;
            state.started_at = Some(Utc::now());
            state.status("Monitoring started")
        };

        self.cancel = Some(cancel.clone());
        tokio::spawn(tick_loop(period, cancel, self.command_tx.clone()));

        info!(interval_secs = period.as_secs(), "starting concurrent domain monitoring");
        self.send_notification(format!(
            "Monitoring started with a {}s interval",
            period.as_secs()
        ))
        .await;

        let _ = respond_to.send(status);
    }

    async fn handle_stop(&mut self, respond_to: Option<oneshot::Sender<MonitoringStatus>>) {
        let was_running = self.state.read().await.running;
        if !was_running {
            if let Some(respond_to) = respond_to {
                let state = self.state.read().await;
                let _ = respond_to.send(state.status("Monitoring already stopped"));
            }
            return;
        }

        info!("stopping domain monitoring");

        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }

        let torn_down: Vec<CheckerHandle> = {
            let mut state = self.state.write().await;
            state.running = false;
            state.started_at = None;
            state.interval = Duration::ZERO;
            state.checkers.drain().map(|(_, handle)| handle).collect()
        };

        for handle in &torn_down {
            debug!(domain = %handle.domain, "shutting down domain checker");
            handle.shutdown().await;
        }

        self.send_notification("Monitoring stopped".to_string()).await;

        if let Some(respond_to) = respond_to {
            let state = self.state.read().await;
            let _ = respond_to.send(state.status("Monitoring stopped"));
        }
    }

    /// Spawn one checker per configured domain.
    ///
    /// A config load failure is logged and leaves the registry empty;
    /// monitoring still runs, it just checks nothing until the next start.
    async fn spawn_checkers(&self) {
        let configs = match self.store.get_domain_configs().await {
            Ok(configs) => configs,
            Err(err) => {
                error!("failed to load domain configs: {err}");
                return;
            }
        };

        let mut state = self.state.write().await;
        for config in configs {
            if state.checkers.contains_key(&config.domain) {
                continue;
            }

            let handle = CheckerHandle::spawn(
                config.clone(),
                Arc::clone(&self.resolver),
                Arc::clone(&self.store),
                self.bus.clone(),
                self.command_tx.clone(),
            );
            state.checkers.insert(config.domain, handle);
        }

        debug!(checkers = state.checkers.len(), "domain checkers ready");
    }

    /// Fan a check trigger out to every live checker without waiting.
    async fn trigger_checks(&self) {
        let state = self.state.read().await;
        if !state.running {
            debug!("tick after stop, ignoring");
            return;
        }

        info!(domains = state.checkers.len(), "starting concurrent domain check");
        for handle in state.checkers.values() {
            handle.trigger_check();
        }
    }

    /// Scatter a stats request to every registered checker and gather what
    /// arrives in time. Replies with whatever was collected, even nothing.
    async fn collect_cached_stats(&self, respond_to: oneshot::Sender<Vec<DomainStats>>) {
        let handles: Vec<CheckerHandle> = {
            let state = self.state.read().await;
            if !state.running {
                warn!("monitoring not active, no stats available");
                let _ = respond_to.send(Vec::new());
                return;
            }
            state.checkers.values().cloned().collect()
        };

        if handles.is_empty() {
            warn!("no domain checkers available");
            let _ = respond_to.send(Vec::new());
            return;
        }

        debug!(total_domains = handles.len(), "collecting cached stats from all domain checkers");

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let expected = handles.len();
            let (results_tx, mut results_rx) = mpsc::channel(expected);

            for handle in handles {
                let state = Arc::clone(&state);
                let results_tx = results_tx.clone();

                tokio::spawn(async move {
                    // A concurrent stop may have torn this checker down
                    // between snapshot and request.
                    if !state.read().await.checkers.contains_key(&handle.domain) {
                        debug!(domain = %handle.domain, "checker no longer active, skipping");
                        let _ = results_tx.send((handle.domain.clone(), None)).await;
                        return;
                    }

                    let stats = match timeout(STATS_REQUEST_TIMEOUT, handle.cached_stats()).await {
                        Ok(stats) => stats,
                        Err(_) => {
                            debug!(domain = %handle.domain, "cached stats request timed out");
                            None
                        }
                    };

                    let _ = results_tx.send((handle.domain.clone(), stats)).await;
                });
            }
            drop(results_tx);

            let mut collected = Vec::new();
            let mut skipped = 0usize;
            let mut answered = 0usize;

            let deadline = tokio::time::sleep(STATS_COLLECT_TIMEOUT);
            tokio::pin!(deadline);

            while answered < expected {
                tokio::select! {
                    result = results_rx.recv() => match result {
                        Some((_, Some(stats))) => {
                            answered += 1;
                            collected.push(stats);
                        }
                        Some((domain, None)) => {
                            answered += 1;
                            skipped += 1;
                            debug!(%domain, "no stats collected for domain");
                        }
                        None => break,
                    },

                    _ = &mut deadline => {
                        warn!(
                            collected = answered,
                            expected,
                            missing = expected - answered,
                            "timeout collecting cached stats"
                        );
                        break;
                    }
                }
            }

            info!(
                domains_with_stats = collected.len(),
                total_domains = expected,
                skipped,
                "cached stats collection complete"
            );
            let _ = respond_to.send(collected);
        });
    }

    async fn handle_report(&self, report: CheckerReport) {
        match report {
            CheckerReport::DomainChecked { mut check } => {
                // A checker torn down by a concurrent stop may still flush
                // its last result; stale reports are dropped.
                if !self.state.read().await.checkers.contains_key(&check.domain) {
                    debug!(domain = %check.domain, "report from unregistered checker, ignoring");
                    return;
                }

                let elapsed = Utc::now().signed_duration_since(check.timestamp);
                check.request_time_ms = elapsed
                    .num_microseconds()
                    .map(|us| us as f64 / 1000.0)
                    .unwrap_or_default();

                info!(
                    domain = %check.domain,
                    valid = check.valid,
                    expected = %check.expected_ip,
                    actual = ?check.resolved_ips,
                    request_ms = check.request_time_ms,
                    "domain check completed"
                );

                match serde_json::to_value(&check) {
                    Ok(value) => {
                        self.bus.broadcast(Event::new(
                            EVENT_MONITORING_IP,
                            serde_json::json!({ "check": value }),
                        ));
                    }
                    Err(err) => error!("failed to serialize check: {err}"),
                }
            }

            CheckerReport::Alert { level, message } => match level {
                AlertLevel::Warning => warn!(%level, "{message}"),
                AlertLevel::Error => error!(%level, "{message}"),
            },
        }
    }

    /// Fire the start/stop notification without blocking the transition.
    /// A failure comes back into the inbox as an ERROR alert; no retries.
    async fn send_notification(&self, message: String) {
        let Some(notifier) = self.notifier.clone() else {
            debug!("notifier not configured, skipping notification");
            return;
        };
        if self.recipients.is_empty() {
            debug!("no notification recipients configured, skipping notification");
            return;
        }

        let status = self.state.read().await.status(message);
        let recipients = self.recipients.clone();
        let commands = self.command_tx.clone();

        tokio::spawn(async move {
            match notifier
                .send_monitoring_notification(&recipients, &status)
                .await
            {
                Ok(()) => info!("monitoring notification sent"),
                Err(err) => {
                    error!("failed to send monitoring notification: {err:#}");
                    let _ = commands
                        .send(MonitorCommand::Report(CheckerReport::Alert {
                            level: AlertLevel::Error,
                            message: format!("failed to send notification email: {err:#}"),
                        }))
                        .await;
                }
            }
        });
    }
}

/// Free-running timer task. Sends a check-all command each period until the
/// token cancels it; the first period elapses before the first tick.
async fn tick_loop(
    period: Duration,
    cancel: CancellationToken,
    commands: mpsc::Sender<MonitorCommand>,
) {
    let mut ticker = interval(period);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("tick loop cancelled");
                return;
            }

            _ = ticker.tick() => {
                debug!("monitoring tick, checking all domains");
                if commands.send(MonitorCommand::CheckAllDomains).await.is_err() {
                    debug!("supervisor gone, tick loop exiting");
                    return;
                }
            }
        }
    }
}

/// Handle for controlling the monitor supervisor.
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    /// Spawn the supervisor actor and return a handle to it.
    pub fn spawn(
        store: Arc<dyn CheckStore>,
        resolver: Arc<dyn Resolve>,
        bus: EventBus,
        notifier: Option<Arc<dyn Notify>>,
        recipients: Vec<String>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(MONITOR_INBOX);

        let actor = MonitorActor::new(
            store,
            resolver,
            bus,
            notifier,
            recipients,
            cmd_rx,
            cmd_tx.clone(),
        );
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Begin periodic monitoring with the given interval.
    pub async fn start_monitoring(&self, interval_secs: u64) -> Result<MonitoringStatus> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::StartMonitoring {
                interval_secs,
                respond_to: tx,
            })
            .await
            .context("failed to send StartMonitoring command")?;

        rx.await.context("failed to receive response")
    }

    /// Stop periodic monitoring and tear down all checkers.
    pub async fn stop_monitoring(&self) -> Result<MonitoringStatus> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::StopMonitoring { respond_to: tx })
            .await
            .context("failed to send StopMonitoring command")?;

        rx.await.context("failed to receive response")
    }

    /// Snapshot the current lifecycle state.
    pub async fn status(&self) -> Result<MonitoringStatus> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::GetStatus { respond_to: tx })
            .await
            .context("failed to send GetStatus command")?;

        rx.await.context("failed to receive response")
    }

    /// Collect cached stats from all live checkers.
    ///
    /// Bounded in time; the result may be partial or empty.
    pub async fn all_cached_stats(&self) -> Result<Vec<DomainStats>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::GetAllCachedStats { respond_to: tx })
            .await
            .context("failed to send GetAllCachedStats command")?;

        rx.await.context("failed to receive response")
    }

    /// Trigger an immediate check of all domains.
    pub async fn check_all(&self) -> Result<()> {
        self.sender
            .send(MonitorCommand::CheckAllDomains)
            .await
            .context("failed to send CheckAllDomains command")?;
        Ok(())
    }

    /// Shut the supervisor down.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(MonitorCommand::Shutdown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainConfig;
    use crate::resolver::StaticResolver;
    use crate::storage::{MemoryStore, StorageError, StorageResult};
    use crate::DomainCheck;
    use async_trait::async_trait;

    fn configs(domains: &[&str]) -> Vec<DomainConfig> {
        domains
            .iter()
            .map(|domain| DomainConfig {
                domain: domain.to_string(),
                expected_ip: "1.2.3.4".to_string(),
                enabled: false,
            })
            .collect()
    }

    fn spawn_monitor(domains: &[&str]) -> (MonitorHandle, EventBus) {
        let store = Arc::new(MemoryStore::with_configs(configs(domains)));
        let mut resolver = StaticResolver::new();
        for domain in domains {
            resolver = resolver.with_ips(domain, &["1.2.3.4"]);
        }
        let bus = EventBus::new();
        let handle = MonitorHandle::spawn(store, Arc::new(resolver), bus.clone(), None, vec![]);
        (handle, bus)
    }

    #[tokio::test]
    async fn start_reports_running_with_checker_count() {
        let (monitor, _bus) = spawn_monitor(&["a.example", "b.example"]);

        let status = monitor.start_monitoring(30).await.unwrap();
        assert!(status.running);
        assert_eq!(status.interval_secs, 30);
        assert_eq!(status.active_checkers, 2);
        assert!(status.started_at.is_some());

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn double_start_changes_nothing() {
        let (monitor, _bus) = spawn_monitor(&["a.example"]);

        let first = monitor.start_monitoring(30).await.unwrap();
        let second = monitor.start_monitoring(60).await.unwrap();

        assert!(second.running);
        assert_eq!(second.interval_secs, 30);
        assert_eq!(second.started_at, first.started_at);
        assert_eq!(second.message, "Monitoring already running");

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn stop_tears_down_all_checkers() {
        let (monitor, _bus) = spawn_monitor(&["a.example", "b.example"]);

        monitor.start_monitoring(30).await.unwrap();
        let status = monitor.stop_monitoring().await.unwrap();

        assert!(!status.running);
        assert_eq!(status.interval_secs, 0);
        assert_eq!(status.active_checkers, 0);
        assert_eq!(status.message, "Monitoring stopped");

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn double_stop_is_a_no_op() {
        let (monitor, _bus) = spawn_monitor(&["a.example"]);

        monitor.start_monitoring(30).await.unwrap();
        monitor.stop_monitoring().await.unwrap();
        let status = monitor.stop_monitoring().await.unwrap();

        assert!(!status.running);
        assert_eq!(status.message, "Monitoring already stopped");

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn status_when_idle_reports_stopped() {
        let (monitor, _bus) = spawn_monitor(&["a.example"]);

        let status = monitor.status().await.unwrap();
        assert!(!status.running);
        assert_eq!(status.active_checkers, 0);
        assert_eq!(status.message, "Monitoring stopped");

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn stats_are_empty_while_idle() {
        let (monitor, _bus) = spawn_monitor(&["a.example"]);

        assert!(monitor.all_cached_stats().await.unwrap().is_empty());

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn config_load_failure_leaves_zero_checkers() {
        struct NoConfigStore;

        #[async_trait]
        impl CheckStore for NoConfigStore {
            async fn get_domain_configs(&self) -> StorageResult<Vec<DomainConfig>> {
                Err(StorageError::Backend("table unreadable".to_string()))
            }
            async fn add_domain_config(&self, _config: DomainConfig) -> StorageResult<()> {
                Ok(())
            }
            async fn remove_domain_config(&self, _domain: &str) -> StorageResult<()> {
                Ok(())
            }
            async fn save_check(&self, _check: &DomainCheck) -> StorageResult<()> {
                Ok(())
            }
            async fn get_checks(&self) -> StorageResult<Vec<DomainCheck>> {
                Ok(vec![])
            }
            async fn get_checks_by_domain(&self, _domain: &str) -> StorageResult<Vec<DomainCheck>> {
                Ok(vec![])
            }
        }

        let bus = EventBus::new();
        let monitor = MonitorHandle::spawn(
            Arc::new(NoConfigStore),
            Arc::new(StaticResolver::new()),
            bus,
            None,
            vec![],
        );

        let status = monitor.start_monitoring(30).await.unwrap();
        assert!(status.running);
        assert_eq!(status.active_checkers, 0);

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn completed_checks_are_rebroadcast_with_request_time() {
        let (monitor, bus) = spawn_monitor(&["a.example"]);
        let mut sub = bus.subscribe();

        monitor.start_monitoring(3600).await.unwrap();
        monitor.check_all().await.unwrap();

        let event = loop {
            let event = tokio::time::timeout(Duration::from_secs(2), sub.recv())
                .await
                .unwrap()
                .unwrap();
            if event.kind == EVENT_MONITORING_IP {
                break event;
            }
        };

        let check = &event.data["check"];
        assert_eq!(check["domain"], "a.example");
        assert_eq!(check["valid"], true);
        assert!(check["request_time_ms"].as_f64().unwrap() >= 0.0);

        monitor.shutdown().await;
    }
}
