//! Workout service
//!
//! Every operation takes the caller's user id and is scoped to it. Another
//! user's workout is indistinguishable from a missing one.

use crate::db::repositories::WorkoutRepository;
use crate::models::{
    messages, parse_workout_date, FieldErrors, NewWorkout, Workout, WorkoutInput, DEFAULT_LOCATION,
};
use anyhow::Context;
use chrono::SecondsFormat;
use std::sync::Arc;

/// Maximum location length
pub const LOCATION_MAX_LENGTH: usize = 100;

/// Error types for workout service operations
#[derive(Debug, thiserror::Error)]
pub enum WorkoutServiceError {
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Workout not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Workout logging service
pub struct WorkoutService {
    repo: Arc<dyn WorkoutRepository>,
}

impl WorkoutService {
    pub fn new(repo: Arc<dyn WorkoutRepository>) -> Self {
        Self { repo }
    }

    /// The caller's workouts, newest first
    pub async fn list(&self, user_id: i64) -> Result<Vec<Workout>, WorkoutServiceError> {
        Ok(self
            .repo
            .list_by_user(user_id)
            .await
            .context("Failed to list workouts")?)
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Workout, WorkoutServiceError> {
        self.repo
            .get_for_user(user_id, id)
            .await
            .context("Failed to get workout")?
            .ok_or(WorkoutServiceError::NotFound)
    }

    /// Create a workout owned by the caller.
    pub async fn create(&self, user_id: i64, input: WorkoutInput) -> Result<Workout, WorkoutServiceError> {
        let workout = validate_workout(&input).map_err(WorkoutServiceError::Validation)?;

        let created = self
            .repo
            .create(user_id, &workout)
            .await
            .context("Failed to create workout")?;
        tracing::debug!("User {} logged workout {}", user_id, created.id);
        Ok(created)
    }

    /// Full replace
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        input: WorkoutInput,
    ) -> Result<Workout, WorkoutServiceError> {
        self.get(user_id, id).await?;
        let workout = validate_workout(&input).map_err(WorkoutServiceError::Validation)?;
        self.save(user_id, id, &workout).await
    }

    /// Partial update
    pub async fn patch(
        &self,
        user_id: i64,
        id: i64,
        input: WorkoutInput,
    ) -> Result<Workout, WorkoutServiceError> {
        let existing = self.get(user_id, id).await?;
        let merged = merge_workout(&existing, input);
        let workout = validate_workout(&merged).map_err(WorkoutServiceError::Validation)?;
        self.save(user_id, id, &workout).await
    }

    async fn save(
        &self,
        user_id: i64,
        id: i64,
        workout: &NewWorkout,
    ) -> Result<Workout, WorkoutServiceError> {
        self.repo
            .update(user_id, id, workout)
            .await
            .context("Failed to update workout")?
            .ok_or(WorkoutServiceError::NotFound)
    }

    /// Delete a workout and its entries
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), WorkoutServiceError> {
        let deleted = self
            .repo
            .delete(user_id, id)
            .await
            .context("Failed to delete workout")?;

        if !deleted {
            return Err(WorkoutServiceError::NotFound);
        }
        Ok(())
    }
}

fn merge_workout(existing: &Workout, input: WorkoutInput) -> WorkoutInput {
    WorkoutInput {
        date: input
            .date
            .or_else(|| Some(existing.date.to_rfc3339_opts(SecondsFormat::Secs, true))),
        location: input
            .location
            .or_else(|| Some(Some(existing.location.clone()))),
        notes: input.notes.or_else(|| Some(existing.notes.clone())),
    }
}

fn validate_workout(input: &WorkoutInput) -> Result<NewWorkout, FieldErrors> {
    let mut errors = FieldErrors::new();

    let date = match input.date.as_deref().map(str::trim) {
        None => {
            errors.add("date", messages::REQUIRED);
            None
        }
        Some(value) => {
            let parsed = parse_workout_date(value);
            if parsed.is_none() {
                errors.add("date", messages::INVALID_DATETIME);
            }
            parsed
        }
    };

    let location = match input.location.as_ref().map(|l| l.as_deref().map(str::trim)) {
        None => DEFAULT_LOCATION.to_string(),
        Some(None) => {
            errors.add("location", messages::NOT_NULL);
            String::new()
        }
        Some(Some("")) => {
            errors.add("location", messages::BLANK);
            String::new()
        }
        Some(Some(location)) => {
            if location.chars().count() > LOCATION_MAX_LENGTH {
                errors.add("location", messages::max_length(LOCATION_MAX_LENGTH));
            }
            location.to_string()
        }
    };

    let notes = input
        .notes
        .as_ref()
        .and_then(|n| n.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    match date {
        Some(date) if errors.is_empty() => Ok(NewWorkout {
            date,
            location,
            notes,
        }),
        _ => Err(errors),
    }
}
