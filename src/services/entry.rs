//! Workout entry service
//!
//! Entries have no owner column of their own; they belong to whoever owns
//! the parent workout. Writes check that the target workout belongs to the
//! caller and that the exercise exists before touching storage.

use crate::db::repositories::{EntryRepository, ExerciseRepository, WorkoutRepository};
use crate::models::{messages, EntryInput, FieldErrors, NewEntry, WorkoutEntry};
use anyhow::Context;
use std::sync::Arc;

/// Upper bound for `sets` and `rest_seconds`; both are stored as 32-bit integers
pub const MAX_INTEGER: i64 = i32::MAX as i64;

/// Error types for entry service operations
#[derive(Debug, thiserror::Error)]
pub enum EntryServiceError {
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Entry not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Workout entry service
pub struct EntryService {
    entries: Arc<dyn EntryRepository>,
    workouts: Arc<dyn WorkoutRepository>,
    exercises: Arc<dyn ExerciseRepository>,
}

impl EntryService {
    pub fn new(
        entries: Arc<dyn EntryRepository>,
        workouts: Arc<dyn WorkoutRepository>,
        exercises: Arc<dyn ExerciseRepository>,
    ) -> Self {
        Self {
            entries,
            workouts,
            exercises,
        }
    }

    /// The caller's entries, optionally limited to one workout
    pub async fn list(
        &self,
        user_id: i64,
        workout_id: Option<i64>,
    ) -> Result<Vec<WorkoutEntry>, EntryServiceError> {
        Ok(self
            .entries
            .list_for_user(user_id, workout_id)
            .await
            .context("Failed to list entries")?)
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<WorkoutEntry, EntryServiceError> {
        self.entries
            .get_for_user(user_id, id)
            .await
            .context("Failed to get entry")?
            .ok_or(EntryServiceError::NotFound)
    }

    pub async fn create(
        &self,
        user_id: i64,
        input: EntryInput,
    ) -> Result<WorkoutEntry, EntryServiceError> {
        let entry = self.validate(user_id, &input).await?;

        Ok(self
            .entries
            .create(&entry)
            .await
            .context("Failed to create entry")?)
    }

    /// Full replace
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        input: EntryInput,
    ) -> Result<WorkoutEntry, EntryServiceError> {
        self.get(user_id, id).await?;
        let entry = self.validate(user_id, &input).await?;
        self.save(user_id, id, &entry).await
    }

    /// Partial update
    pub async fn patch(
        &self,
        user_id: i64,
        id: i64,
        input: EntryInput,
    ) -> Result<WorkoutEntry, EntryServiceError> {
        let existing = self.get(user_id, id).await?;
        let merged = merge_entry(&existing, input);
        let entry = self.validate(user_id, &merged).await?;
        self.save(user_id, id, &entry).await
    }

    async fn save(
        &self,
        user_id: i64,
        id: i64,
        entry: &NewEntry,
    ) -> Result<WorkoutEntry, EntryServiceError> {
        self.entries
            .update(user_id, id, entry)
            .await
            .context("Failed to update entry")?
            .ok_or(EntryServiceError::NotFound)
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), EntryServiceError> {
        let deleted = self
            .entries
            .delete(user_id, id)
            .await
            .context("Failed to delete entry")?;

        if !deleted {
            return Err(EntryServiceError::NotFound);
        }
        Ok(())
    }

    /// Field validation plus the workout ownership and exercise existence checks.
    async fn validate(&self, user_id: i64, input: &EntryInput) -> Result<NewEntry, EntryServiceError> {
        let mut errors = validate_fields(input);

        if let Some(workout_id) = input.workout {
            let owned = self
                .workouts
                .is_owned_by(workout_id, user_id)
                .await
                .context("Failed to check workout ownership")?;
            if !owned {
                errors.add("workout", messages::does_not_exist(workout_id));
            }
        }

        if let Some(exercise_id) = input.exercise {
            let exists = self
                .exercises
                .get_by_id(exercise_id)
                .await
                .context("Failed to look up exercise")?
                .is_some();
            if !exists {
                errors.add("exercise", messages::does_not_exist(exercise_id));
            }
        }

        match (input.workout, input.exercise, input.quantity) {
            (Some(workout_id), Some(exercise_id), Some(quantity)) if errors.is_empty() => {
                Ok(NewEntry {
                    workout_id,
                    exercise_id,
                    sets: input.sets.unwrap_or(1),
                    quantity,
                    weight: input.weight.unwrap_or(0.0),
                    rest_seconds: input.rest_seconds.flatten(),
                })
            }
            _ => Err(EntryServiceError::Validation(errors)),
        }
    }
}

fn merge_entry(existing: &WorkoutEntry, input: EntryInput) -> EntryInput {
    EntryInput {
        workout: input.workout.or(Some(existing.workout_id)),
        exercise: input.exercise.or(Some(existing.exercise_id)),
        sets: input.sets.or(Some(existing.sets)),
        quantity: input.quantity.or(Some(existing.quantity)),
        weight: input.weight.or(Some(existing.weight)),
        rest_seconds: input.rest_seconds.or(Some(existing.rest_seconds)),
    }
}

/// Checks that need no database access
fn validate_fields(input: &EntryInput) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if input.workout.is_none() {
        errors.add("workout", messages::REQUIRED);
    }
    if input.exercise.is_none() {
        errors.add("exercise", messages::REQUIRED);
    }

    if let Some(sets) = input.sets {
        if sets < 1 {
            errors.add("sets", messages::min_value(1));
        } else if sets > MAX_INTEGER {
            errors.add("sets", messages::max_value(MAX_INTEGER));
        }
    }

    match input.quantity {
        None => errors.add("quantity", messages::REQUIRED),
        Some(q) if !q.is_finite() => errors.add("quantity", messages::INVALID_NUMBER),
        Some(_) => {}
    }

    if let Some(weight) = input.weight {
        if !weight.is_finite() {
            errors.add("weight", messages::INVALID_NUMBER);
        } else if weight < 0.0 {
            errors.add("weight", messages::min_value(0));
        }
    }

    if let Some(Some(rest)) = input.rest_seconds {
        if rest < 0 {
            errors.add("rest_seconds", messages::min_value(0));
        } else if rest > MAX_INTEGER {
            errors.add("rest_seconds", messages::max_value(MAX_INTEGER));
        }
    }

    errors
}
