//! Exercise service
//!
//! Business logic for the shared exercise catalog. The catalog is global:
//! there is no ownership scoping, and any authenticated caller may edit it.

use crate::db::repositories::ExerciseRepository;
use crate::models::{
    messages, Exercise, ExerciseCategory, ExerciseInput, ExerciseType, FieldErrors, NewExercise,
    Unit,
};
use anyhow::Context;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum exercise name length
pub const NAME_MAX_LENGTH: usize = 100;

/// Maximum length of stored image/video filenames
pub const MEDIA_MAX_LENGTH: usize = 100;

/// Error types for exercise service operations
#[derive(Debug, thiserror::Error)]
pub enum ExerciseServiceError {
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Exercise not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Exercise catalog service
pub struct ExerciseService {
    repo: Arc<dyn ExerciseRepository>,
}

impl ExerciseService {
    pub fn new(repo: Arc<dyn ExerciseRepository>) -> Self {
        Self { repo }
    }

    /// All exercises, ordered by id
    pub async fn list(&self) -> Result<Vec<Exercise>, ExerciseServiceError> {
        Ok(self.repo.list().await.context("Failed to list exercises")?)
    }

    pub async fn get(&self, id: i64) -> Result<Exercise, ExerciseServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get exercise")?
            .ok_or(ExerciseServiceError::NotFound)
    }

    pub async fn create(&self, input: ExerciseInput) -> Result<Exercise, ExerciseServiceError> {
        let exercise = validate_exercise(&input).map_err(ExerciseServiceError::Validation)?;

        let created = self
            .repo
            .create(&exercise)
            .await
            .context("Failed to create exercise")?;
        tracing::info!("Created exercise {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Full replace. Omitted optional fields are cleared.
    pub async fn update(
        &self,
        id: i64,
        input: ExerciseInput,
    ) -> Result<Exercise, ExerciseServiceError> {
        // Existence first so a missing id wins over a bad body
        self.get(id).await?;
        let exercise = validate_exercise(&input).map_err(ExerciseServiceError::Validation)?;
        self.save(id, &exercise).await
    }

    /// Partial update. Omitted fields keep their stored values.
    pub async fn patch(&self, id: i64, input: ExerciseInput) -> Result<Exercise, ExerciseServiceError> {
        let existing = self.get(id).await?;
        let merged = merge_exercise(&existing, input);
        let exercise = validate_exercise(&merged).map_err(ExerciseServiceError::Validation)?;
        self.save(id, &exercise).await
    }

    async fn save(&self, id: i64, exercise: &NewExercise) -> Result<Exercise, ExerciseServiceError> {
        self.repo
            .update(id, exercise)
            .await
            .context("Failed to update exercise")?
            .ok_or(ExerciseServiceError::NotFound)
    }

    /// Delete an exercise and, by cascade, every entry that references it.
    pub async fn delete(&self, id: i64) -> Result<(), ExerciseServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete exercise")?;

        if !deleted {
            return Err(ExerciseServiceError::NotFound);
        }
        tracing::info!("Deleted exercise {}", id);
        Ok(())
    }
}

/// Fill fields absent from a partial update with the stored values
fn merge_exercise(existing: &Exercise, input: ExerciseInput) -> ExerciseInput {
    ExerciseInput {
        name: input.name.or_else(|| Some(existing.name.clone())),
        category: input.category.or_else(|| Some(existing.category.to_string())),
        exercise_type: input
            .exercise_type
            .or_else(|| Some(existing.exercise_type.to_string())),
        unit: input.unit.or_else(|| Some(existing.unit.to_string())),
        description: input.description.or_else(|| Some(existing.description.clone())),
        image: input.image.or_else(|| Some(existing.image.clone())),
        video: input.video.or_else(|| Some(existing.video.clone())),
    }
}

/// Validate an exercise body, collecting every field error.
fn validate_exercise(input: &ExerciseInput) -> Result<NewExercise, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = match input.name.as_deref().map(str::trim) {
        None => {
            errors.add("name", messages::REQUIRED);
            None
        }
        Some("") => {
            errors.add("name", messages::BLANK);
            None
        }
        Some(name) if name.chars().count() > NAME_MAX_LENGTH => {
            errors.add("name", messages::max_length(NAME_MAX_LENGTH));
            None
        }
        Some(name) => Some(name.to_string()),
    };

    let category = parse_choice::<ExerciseCategory>(&mut errors, "category", input.category.as_deref());
    let exercise_type = parse_choice::<ExerciseType>(&mut errors, "type", input.exercise_type.as_deref());
    let unit = match input.unit.as_deref() {
        None => Some(Unit::default()),
        value => parse_choice::<Unit>(&mut errors, "unit", value),
    };

    let description = optional_text(input.description.as_ref());
    let image = optional_text(input.image.as_ref());
    let video = optional_text(input.video.as_ref());
    for (field, value) in [("image", &image), ("video", &video)] {
        if value.as_ref().is_some_and(|v| v.chars().count() > MEDIA_MAX_LENGTH) {
            errors.add(field, messages::max_length(MEDIA_MAX_LENGTH));
        }
    }

    match (name, category, exercise_type, unit) {
        (Some(name), Some(category), Some(exercise_type), Some(unit)) if errors.is_empty() => {
            Ok(NewExercise {
                name,
                category,
                exercise_type,
                unit,
                description,
                image,
                video,
            })
        }
        _ => Err(errors),
    }
}

fn parse_choice<T: FromStr>(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<T> {
    match value.map(str::trim) {
        None => {
            errors.add(field, messages::REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, messages::BLANK);
            None
        }
        Some(value) => match T::from_str(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.add(field, messages::invalid_choice(value));
                None
            }
        },
    }
}

/// Blank and null optional text both store as NULL
fn optional_text(value: Option<&Option<String>>) -> Option<String> {
    value
        .and_then(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
