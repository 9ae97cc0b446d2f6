use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub planner: String,
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let planner_result = state.planner.health_check().await;
    let planner_status = if planner_result.is_ok() { "ok" } else { "error" };

    // The store is in-process, so the planner is the only external dependency;
    // a failing planner degrades the service but PM tracking keeps working.
    let status = if planner_result.is_ok() {
        "healthy"
    } else {
        "degraded"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                planner: planner_status.to_string(),
            },
        }),
    )
}
