//! Workout entry API endpoints
//!
//! - GET /api/entries[?workout={id}] - The caller's entries
//! - POST /api/entries - Log an entry into one of the caller's workouts
//! - GET/PUT/PATCH/DELETE /api/entries/{id}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ResourceId, ValidatedJson};
use crate::models::{messages, EntryInput, FieldErrors, WorkoutEntry};

/// Query parameters for listing entries
#[derive(Debug, Default, Deserialize)]
pub struct ListEntriesQuery {
    #[serde(default)]
    pub workout: Option<String>,
}

impl ListEntriesQuery {
    fn workout_id(&self) -> Result<Option<i64>, ApiError> {
        match self.workout.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                ApiError::field_errors(FieldErrors::single("workout", messages::INVALID_NUMBER))
            }),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route(
            "/entries/{id}",
            get(get_entry)
                .put(update_entry)
                .patch(patch_entry)
                .delete(delete_entry),
        )
}

async fn list_entries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<Vec<WorkoutEntry>>, ApiError> {
    let workout_id = query.workout_id()?;
    Ok(Json(state.entry_service.list(user.id(), workout_id).await?))
}

async fn create_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<EntryInput>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.entry_service.create(user.id(), body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
) -> Result<Json<WorkoutEntry>, ApiError> {
    Ok(Json(state.entry_service.get(user.id(), id).await?))
}

async fn update_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
    ValidatedJson(body): ValidatedJson<EntryInput>,
) -> Result<Json<WorkoutEntry>, ApiError> {
    Ok(Json(state.entry_service.update(user.id(), id, body).await?))
}

async fn patch_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
    ValidatedJson(body): ValidatedJson<EntryInput>,
) -> Result<Json<WorkoutEntry>, ApiError> {
    Ok(Json(state.entry_service.patch(user.id(), id, body).await?))
}

async fn delete_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ResourceId(id): ResourceId,
) -> Result<StatusCode, ApiError> {
    state.entry_service.delete(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
