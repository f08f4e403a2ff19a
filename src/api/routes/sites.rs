//! Host site control endpoints
//!
//! These talk straight to the site adapter; the monitoring core is not
//! involved. Control progress is mirrored onto the event bus so dashboards
//! can follow along.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::{ApiError, ApiResult, ApiState};
use crate::events::{EVENT_SITE_CONTROL, Event};
use crate::sites::SiteAction;

#[derive(Debug, Deserialize)]
pub struct SiteControlRequest {
    site_name: String,
    action: String,
}

/// GET /api/v1/sites
pub async fn list_sites(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let sites = state
        .sites
        .list_sites()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "sites": sites,
        "count": sites.len(),
    })))
}

/// POST /api/v1/sites/control
pub async fn control_site(
    State(state): State<ApiState>,
    Json(request): Json<SiteControlRequest>,
) -> ApiResult<Json<Value>> {
    if request.site_name.is_empty() {
        return Err(ApiError::InvalidRequest("site_name is required".to_string()));
    }

    let action: SiteAction = request
        .action
        .parse()
        .map_err(|err: anyhow::Error| ApiError::InvalidRequest(err.to_string()))?;

    info!(site = %request.site_name, %action, "site control requested");

    state.bus.broadcast(Event::new(
        EVENT_SITE_CONTROL,
        json!({
            "site": request.site_name,
            "action": action.to_string(),
            "in_progress": true,
        }),
    ));

    let result = state
        .sites
        .control_site(&request.site_name, action)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    state.bus.broadcast(Event::new(
        EVENT_SITE_CONTROL,
        json!({
            "site": result.site,
            "action": result.action,
            "success": result.success,
            "in_progress": false,
        }),
    ));

    Ok(Json(json!(result)))
}
