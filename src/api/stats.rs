//! Statistics API endpoint
//!
//! - GET /api/estadisticas - Aggregates over the caller's history

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::Stats;

pub fn router() -> Router<AppState> {
    Router::new().route("/estadisticas", get(get_stats))
}

async fn get_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Stats>, ApiError> {
    Ok(Json(state.stats_service.for_user(user.id()).await?))
}
