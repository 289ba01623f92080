//! Health check endpoint
//!
//! - GET /api/health - Liveness plus a database ping

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.pool.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check database ping failed: {:#}", e);
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: if database == "ok" { "ok" } else { "degraded" },
        database,
    })
}
