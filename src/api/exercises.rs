//! Exercise catalog API endpoints
//!
//! - GET /api/exercises - List the catalog (public)
//! - GET /api/exercises/{id} - Get one exercise (public)
//! - POST /api/exercises - Create (auth)
//! - PUT /api/exercises/{id} - Replace (auth)
//! - PATCH /api/exercises/{id} - Partial update (auth)
//! - DELETE /api/exercises/{id} - Delete, cascading to entries (auth)

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ResourceId, ValidatedJson};
use crate::models::{Exercise, ExerciseInput};

/// Read-only catalog routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/exercises", get(list_exercises))
        .route("/exercises/{id}", get(get_exercise))
}

/// Catalog management routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/exercises", post(create_exercise))
        .route(
            "/exercises/{id}",
            axum::routing::put(update_exercise)
                .patch(patch_exercise)
                .delete(delete_exercise),
        )
}

async fn list_exercises(State(state): State<AppState>) -> Result<Json<Vec<Exercise>>, ApiError> {
    Ok(Json(state.exercise_service.list().await?))
}

async fn get_exercise(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<Exercise>, ApiError> {
    Ok(Json(state.exercise_service.get(id).await?))
}

async fn create_exercise(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<ExerciseInput>,
) -> Result<impl IntoResponse, ApiError> {
    let exercise = state.exercise_service.create(body).await?;
    tracing::debug!("User {} added exercise {}", user.id(), exercise.id);
    Ok((StatusCode::CREATED, Json(exercise)))
}

async fn update_exercise(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ResourceId(id): ResourceId,
    ValidatedJson(body): ValidatedJson<ExerciseInput>,
) -> Result<Json<Exercise>, ApiError> {
    Ok(Json(state.exercise_service.update(id, body).await?))
}

async fn patch_exercise(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ResourceId(id): ResourceId,
    ValidatedJson(body): ValidatedJson<ExerciseInput>,
) -> Result<Json<Exercise>, ApiError> {
    Ok(Json(state.exercise_service.patch(id, body).await?))
}

async fn delete_exercise(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    state.exercise_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
