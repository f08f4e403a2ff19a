//! REST API and SSE server for the monitoring daemon
//!
//! HTTP is the only way in: it issues lifecycle commands to the supervisor,
//! queries stores and stats, controls host sites, and streams live bus
//! events to subscribers.
//!
//! ## Endpoints
//!
//! - `GET  /api/v1/health` - Health check
//! - `POST /api/v1/monitoring/control` - start / stop / status
//! - `GET  /api/v1/monitoring/status` - Lifecycle snapshot
//! - `GET  /api/v1/monitoring/stats` - Cached stats of all domains
//! - `GET  /api/v1/monitoring/events` - SSE stream of live events
//! - `GET  /api/v1/domains` - List domain configs
//! - `POST /api/v1/domains` - Add a domain config
//! - `DELETE /api/v1/domains/:domain` - Remove a domain config
//! - `GET  /api/v1/checks` - Check history (recency / domain / range filters)
//! - `GET  /api/v1/sites` - List host sites
//! - `POST /api/v1/sites/control` - Start / stop / restart a host site

pub mod error;
pub mod routes;
pub mod sse;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable CORS for browser dashboards
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().expect("default bind address is valid"),
            enable_cors: true,
        }
    }
}

/// Build the router with all routes.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route(
            "/api/v1/monitoring/control",
            post(routes::monitoring::control),
        )
        .route(
            "/api/v1/monitoring/status",
            get(routes::monitoring::get_status),
        )
        .route(
            "/api/v1/monitoring/stats",
            get(routes::monitoring::get_all_stats),
        )
        .route("/api/v1/monitoring/events", get(sse::monitoring_events))
        .route(
            "/api/v1/domains",
            get(routes::domains::list_domains).post(routes::domains::add_domain),
        )
        .route(
            "/api/v1/domains/:domain",
            axum::routing::delete(routes::domains::remove_domain),
        )
        .route("/api/v1/checks", get(routes::checks::list_checks))
        .route("/api/v1/sites", get(routes::sites::list_sites))
        .route("/api/v1/sites/control", post(routes::sites::control_site))
        .with_state(state)
}

/// Spawn the API server.
///
/// Starts an Axum HTTP server in a background task and returns the local
/// address it bound to.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    info!("starting API server on {}", config.bind_addr);

    let mut app = build_router(state).layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
