//! Workout API endpoints
//!
//! All routes require authentication and only ever see the caller's
//! workouts. A workout owned by someone else answers 404.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ResourceId, ValidatedJson};
use crate::models::{Workout, WorkoutInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route(
            "/workouts/{id}",
            get(get_workout)
                .put(update_workout)
                .patch(patch_workout)
                .delete(delete_workout),
        )
}

/// GET /api/workouts - newest first
async fn list_workouts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Workout>>, ApiError> {
    Ok(Json(state.workout_service.list(user.id()).await?))
}

/// POST /api/workouts - owner is always the caller
async fn create_workout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<WorkoutInput>,
) -> Result<impl IntoResponse, ApiError> {
    let workout = state.workout_service.create(user.id(), body).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

async fn get_workout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
) -> Result<Json<Workout>, ApiError> {
    Ok(Json(state.workout_service.get(user.id(), id).await?))
}

async fn update_workout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
    ValidatedJson(body): ValidatedJson<WorkoutInput>,
) -> Result<Json<Workout>, ApiError> {
    Ok(Json(state.workout_service.update(user.id(), id, body).await?))
}

async fn patch_workout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
    ValidatedJson(body): ValidatedJson<WorkoutInput>,
) -> Result<Json<Workout>, ApiError> {
    Ok(Json(state.workout_service.patch(user.id(), id, body).await?))
}

async fn delete_workout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    state.workout_service.delete(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
