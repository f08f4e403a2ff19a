//! Check history endpoints

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::{ApiResult, ApiState};

/// Query parameters for the check history
#[derive(Debug, Deserialize)]
pub struct ChecksQuery {
    /// Restrict to one domain
    domain: Option<String>,

    /// Max results when listing recent checks (default: 100)
    limit: Option<usize>,

    /// Start of a time range (ISO 8601, default: 1 hour before `end`)
    start: Option<DateTime<Utc>>,

    /// End of a time range (ISO 8601, default: now)
    end: Option<DateTime<Utc>>,
}

/// GET /api/v1/checks
///
/// Recent checks by default; filter by domain or time range instead.
pub async fn list_checks(
    State(state): State<ApiState>,
    Query(query): Query<ChecksQuery>,
) -> ApiResult<Json<Value>> {
    let checks = if let Some(domain) = &query.domain {
        state.store.get_checks_by_domain(domain).await?
    } else if query.start.is_some() || query.end.is_some() {
        let end = query.end.unwrap_or_else(Utc::now);
        let start = query.start.unwrap_or(end - Duration::hours(1));
        state.store.get_checks_by_time_range(start, end).await?
    } else {
        let limit = query.limit.unwrap_or(100).min(1000);
        state.store.get_recent_checks(limit).await?
    };

    Ok(Json(json!({
        "checks": checks,
        "count": checks.len(),
    })))
}
