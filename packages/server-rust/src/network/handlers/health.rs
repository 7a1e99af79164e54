//! Health, liveness, and readiness endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::HealthState;

/// Returns detailed health information as JSON.
///
/// Always returns 200; the `state` field tells "up but draining" apart from
/// "down". `execution_contexts` counts stacks currently registered, which
/// covers in-flight requests plus any long-lived threads that touched the
/// context.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.lifecycle.health_state();
    let uptime_secs = state.start_time.elapsed().as_secs();

    Json(json!({
        "state": health.as_str(),
        "default_country": state.country.default_country(),
        "execution_contexts": state.country.registry().len(),
        "uptime_secs": uptime_secs,
    }))
}

/// Liveness probe -- always returns 200 OK.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe -- 200 when ready, 503 while starting, draining or stopped.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.lifecycle.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
