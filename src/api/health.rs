//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::ServiceStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub service_running: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub notifications: ServiceStatsSnapshot,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let running = state.notifications.is_running();

    Json(HealthResponse {
        status: if running { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        service_running: running,
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        notifications: state.notifications.stats(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
