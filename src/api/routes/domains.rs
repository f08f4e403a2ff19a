//! Domain configuration endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::DomainConfig;
use crate::api::{ApiError, ApiResult, ApiState};

#[derive(Debug, Deserialize)]
pub struct AddDomainRequest {
    domain: String,
    expected_ip: String,
}

/// GET /api/v1/domains
pub async fn list_domains(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    let configs = state.store.get_domain_configs().await?;

    Ok(Json(json!({
        "domains": configs,
        "count": configs.len(),
    })))
}

/// POST /api/v1/domains
pub async fn add_domain(
    State(state): State<ApiState>,
    Json(request): Json<AddDomainRequest>,
) -> ApiResult<Json<Value>> {
    if request.domain.is_empty() || request.expected_ip.is_empty() {
        return Err(ApiError::InvalidRequest(
            "domain and expected_ip are required".to_string(),
        ));
    }

    let config = DomainConfig {
        domain: request.domain,
        expected_ip: request.expected_ip,
        enabled: false,
    };

    state.store.add_domain_config(config.clone()).await?;
    info!(domain = %config.domain, "domain config added");

    Ok(Json(json!({
        "success": true,
        "domain": config,
    })))
}

/// DELETE /api/v1/domains/:domain
pub async fn remove_domain(
    State(state): State<ApiState>,
    Path(domain): Path<String>,
) -> ApiResult<Json<Value>> {
    state.store.remove_domain_config(&domain).await?;
    info!(%domain, "domain config removed");

    Ok(Json(json!({
        "success": true,
        "domain": domain,
    })))
}
