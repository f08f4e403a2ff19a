//! Monitoring lifecycle endpoints
//!
//! Commands to the supervisor are bounded by a short timeout; an elapsed
//! timeout means "try again", never that the system is broken.

use std::future::Future;
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode, response::Response};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::MonitoringStatus;
use crate::api::{ApiError, ApiResult, ApiState};
use crate::events::Event;

/// How long a lifecycle command may wait for the supervisor's reply.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    action: String,
    interval: Option<u64>,
}

/// POST /api/v1/monitoring/control
///
/// Dispatch a start / stop / status action against the supervisor.
pub async fn control(
    State(state): State<ApiState>,
    Json(request): Json<ControlRequest>,
) -> ApiResult<Response> {
    let current = command(state.monitor.status()).await?;

    match request.action.as_str() {
        "start" => start_with_check(&state, request.interval.unwrap_or(30), &current).await,
        "stop" => stop_with_check(&state, &current).await,
        "status" => Ok(Json(status_body(&current)).into_response()),
        _ => Err(ApiError::InvalidRequest(
            "invalid action. use: start, stop, status".to_string(),
        )),
    }
}

/// GET /api/v1/monitoring/status
pub async fn get_status(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let status = command(state.monitor.status()).await?;
    Ok(Json(status_body(&status)))
}

/// GET /api/v1/monitoring/stats
///
/// Cached stats of every live checker; partial results are normal.
pub async fn get_all_stats(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let stats = command(state.monitor.all_cached_stats()).await?;
    Ok(Json(json!({
        "stats": stats,
        "count": stats.len(),
    })))
}

async fn start_with_check(
    state: &ApiState,
    interval: u64,
    current: &MonitoringStatus,
) -> ApiResult<Response> {
    if current.running {
        warn!("attempt to start monitoring while already running");
        let body = json!({
            "success": false,
            "action": "start",
            "is_running": true,
            "interval": current.interval_secs,
            "message": "monitoring is already running",
        });
        return Ok((StatusCode::CONFLICT, Json(body)).into_response());
    }

    info!(interval, "starting monitoring");
    let status = command(state.monitor.start_monitoring(interval)).await?;

    state.bus.broadcast(Event::new(
        "monitoring_started",
        json!({
            "interval": status.interval_secs,
            "is_running": true,
        }),
    ));

    Ok(Json(json!({
        "success": true,
        "action": "start",
        "is_running": status.running,
        "interval": status.interval_secs,
        "message": status.message,
    }))
    .into_response())
}

async fn stop_with_check(state: &ApiState, current: &MonitoringStatus) -> ApiResult<Response> {
    if !current.running {
        warn!("attempt to stop monitoring while already stopped");
        let body = json!({
            "success": false,
            "action": "stop",
            "is_running": false,
            "message": "monitoring is already stopped",
        });
        return Ok((StatusCode::CONFLICT, Json(body)).into_response());
    }

    info!("stopping monitoring");
    let status = command(state.monitor.stop_monitoring()).await?;

    state.bus.broadcast(Event::new(
        "monitoring_stopped",
        json!({
            "is_running": false,
            "interval": 0,
        }),
    ));

    Ok(Json(json!({
        "success": true,
        "action": "stop",
        "is_running": status.running,
        "message": status.message,
    }))
    .into_response())
}

fn status_body(status: &MonitoringStatus) -> Value {
    let mut body = json!({
        "success": true,
        "is_running": status.running,
        "interval": status.interval_secs,
        "active_checkers": status.active_checkers,
        "message": status.message,
    });

    if let Some(started_at) = status.started_at {
        body["started_at"] = json!(started_at.to_rfc3339());
    }

    body
}

/// Await a supervisor reply, converting an elapsed timeout into a
/// caller-visible "try again".
async fn command<T>(
    fut: impl Future<Output = anyhow::Result<T>>,
) -> ApiResult<T> {
    timeout(COMMAND_TIMEOUT, fut)
        .await
        .map_err(|_| ApiError::Timeout("monitor did not reply in time, try again".to_string()))?
        .map_err(|err| ApiError::Internal(err.to_string()))
}
