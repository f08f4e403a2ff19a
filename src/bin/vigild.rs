use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use vigil::{
    actors::{console::spawn_console_sink, supervisor::MonitorHandle},
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, StorageConfig, read_config_file},
    events::EventBus,
    notify::{Notify, SmtpNotifier},
    resolver::DnsResolver,
    sites::SiteManager,
    storage::{CheckStore, CsvStore, MemoryStore, StorageError},
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short, default_value = "vigil.json")]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("vigil", LevelFilter::DEBUG),
        ("vigild", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match read_config_file(&args.file) {
        Ok(config) => config,
        Err(err) => {
            warn!("could not read config file {}: {err}; using defaults", args.file);
            Config::default()
        }
    };

    let store: Arc<dyn CheckStore> = match &config.storage {
        StorageConfig::None => {
            info!("using in-memory storage, history will not survive a restart");
            Arc::new(MemoryStore::new())
        }
        StorageConfig::Csv {
            configs_path,
            checks_path,
        } => {
            info!(
                configs = %configs_path.display(),
                checks = %checks_path.display(),
                "using CSV storage"
            );
            Arc::new(CsvStore::open(configs_path, checks_path)?)
        }
    };

    // Seed configured domains into the store; already-known domains stay as
    // they are.
    for domain in config.domains.clone().unwrap_or_default() {
        match store.add_domain_config(domain.clone()).await {
            Ok(()) => info!(domain = %domain.domain, "seeded domain config"),
            Err(StorageError::DuplicateDomain(_)) => {
                trace!(domain = %domain.domain, "domain already configured");
            }
            Err(err) => warn!(domain = %domain.domain, "failed to seed domain config: {err}"),
        }
    }

    let bus = EventBus::new();

    let notifier: Option<Arc<dyn Notify>> = match &config.email {
        Some(settings) => Some(Arc::new(SmtpNotifier::new(settings)?)),
        None => {
            info!("no email settings, start/stop notifications disabled");
            None
        }
    };

    let monitor = MonitorHandle::spawn(
        Arc::clone(&store),
        Arc::new(DnsResolver::new()),
        bus.clone(),
        notifier,
        config.recipients.clone(),
    );

    spawn_console_sink(bus.clone());

    let sites = Arc::new(SiteManager::new(config.sites.shell.clone()));

    let api_config = ApiConfig {
        bind_addr: config.api.bind_addr,
        enable_cors: config.api.enable_cors,
    };
    let state = ApiState::new(monitor.clone(), bus.clone(), store, sites);
    let addr = spawn_api_server(api_config, state).await?;

    info!("monitoring daemon ready on http://{addr}");
    info!("  control: POST http://{addr}/api/v1/monitoring/control");
    info!("  events:  GET  http://{addr}/api/v1/monitoring/events");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    if let Err(err) = monitor.stop_monitoring().await {
        error!("failed to stop monitoring cleanly: {err}");
    }
    monitor.shutdown().await;

    Ok(())
}
