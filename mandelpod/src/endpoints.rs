use axum::extract::State;
use axum::http::StatusCode;
use axum::Form;
use serde::Deserialize;

use health::{HealthState, ProbeStatus};

use crate::api::ApiError;
use crate::router::AppState;

pub const WORK_REQUEST_LATENCY: &str = "work_request_latency";

pub async fn host() -> Result<String, ApiError> {
    tracing::info!("GET /host");

    let name = hostname::get()?;
    Ok(name.to_string_lossy().into_owned())
}

/// The synthetic workload. The timing guard observes the render latency on
/// every exit path, so the histogram stays honest even if rendering is ever
/// interrupted.
pub async fn work(State(state): State<AppState>) -> String {
    tracing::info!("GET /work");

    let _timer = common_metrics::timing_guard(WORK_REQUEST_LATENCY);
    state.viewport.render()
}

#[derive(Deserialize)]
pub struct ProbeUpdate {
    state: String,
}

/// Forces the health indicator into any of its states, so a test harness
/// can stage failures before probing. Responds with the replaced state.
pub async fn probe_update(
    State(state): State<AppState>,
    Form(update): Form<ProbeUpdate>,
) -> Result<String, ApiError> {
    tracing::info!(next = %update.state, "POST /probe");

    let next = update.state.parse::<HealthState>()?;
    let previous = state.health.set(next);
    Ok(previous.as_str().to_owned())
}

pub async fn liveness(State(state): State<AppState>) -> ProbeStatus {
    tracing::info!("GET /probe/liveness");

    state.health.liveness()
}

pub async fn readiness(State(state): State<AppState>) -> ProbeStatus {
    tracing::info!("GET /probe/readiness");

    state.health.readiness()
}

pub async fn post_start() -> StatusCode {
    tracing::info!("GET /lifecycle/postStart");

    StatusCode::OK
}

/// Pre-stop hook: releases the shutdown latch so the server drains and
/// exits. Releasing twice is a no-op.
pub async fn pre_stop(State(state): State<AppState>) -> StatusCode {
    tracing::info!("GET /lifecycle/preStop");

    state.shutdown.release();
    StatusCode::OK
}
