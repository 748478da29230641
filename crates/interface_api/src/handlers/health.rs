//! Liveness and readiness probes

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct LivenessReport {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    pub database: &'static str,
}

/// Answers as long as the process is serving requests
pub async fn health_check() -> Json<LivenessReport> {
    Json(LivenessReport {
        service: "billing-api",
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Additionally requires a live database connection; a failed ping reports
/// 503 so load balancers stop routing here until Postgres is back
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessReport>, StatusCode> {
    let ping: Result<i32, sqlx::Error> = sqlx::query_scalar("SELECT 1")
        .fetch_one(&state.pool)
        .await;

    match ping {
        Ok(_) => Ok(Json(ReadinessReport {
            status: "ready",
            database: "reachable",
        })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
