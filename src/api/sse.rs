//! SSE handler streaming live bus events to clients
//!
//! Each client gets its own bus subscription; the subscription unregisters
//! itself when the client goes away and the stream is dropped. A stalled
//! client simply misses events, it never slows the publishers down.

use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::StreamExt;
use futures::stream;
use serde_json::json;
use tokio::time::timeout;
use tracing::info;

use crate::api::ApiState;
use crate::events::Event;

/// How long the initial status lookup may take before the stream starts
/// without it.
const INITIAL_STATUS_TIMEOUT: Duration = Duration::from_millis(500);

/// GET /api/v1/monitoring/events
pub async fn monitoring_events(State(state): State<ApiState>) -> impl IntoResponse {
    info!("SSE client connected");

    let subscription = state.bus.subscribe();

    // Greet the client and hand it the current lifecycle state before the
    // live feed begins. Best effort: a slow supervisor just means no
    // initial status event.
    let mut initial = vec![Event::new("connected", json!({"status": "connected"}))];
    if let Ok(Ok(status)) = timeout(INITIAL_STATUS_TIMEOUT, state.monitor.status()).await {
        initial.push(Event::new(
            "initial_status",
            json!({
                "is_running": status.running,
                "interval": status.interval_secs,
            }),
        ));
    }

    let head = stream::iter(initial).map(|event| SseEvent::default().json_data(&event));

    let tail = stream::unfold(subscription, |mut subscription| async move {
        subscription
            .recv()
            .await
            .map(|event| (SseEvent::default().json_data(&event), subscription))
    });

    Sse::new(head.chain(tail)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("heartbeat"),
    )
}
