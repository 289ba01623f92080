//! Data models
//!
//! This module contains all data structures used throughout Fitlog.
//! Models represent:
//! - Database entities (User, Exercise, Workout, WorkoutEntry)
//! - API request/response types
//! - The statistics payload

mod entry;
mod exercise;
mod stats;
mod user;
mod workout;

pub use entry::{EntryInput, NewEntry, WorkoutEntry};
pub use exercise::{Exercise, ExerciseCategory, ExerciseInput, ExerciseType, NewExercise, Unit};
pub use stats::{DailyCount, ExerciseFrequency, Stats};
pub use user::{CreateUserInput, User, UserProfile};
pub use workout::{parse_workout_date, NewWorkout, Workout, WorkoutInput, DEFAULT_LOCATION};

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name to list of validation messages.
///
/// Serialized as a plain JSON object, e.g. `{"name": ["This field is required."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single error on a single field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was collected, otherwise the collected errors
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Standard validation messages shared by the services.
pub mod messages {
    pub const REQUIRED: &str = "This field is required.";
    pub const BLANK: &str = "This field may not be blank.";
    pub const NOT_NULL: &str = "This field may not be null.";
    pub const INVALID_NUMBER: &str = "A valid number is required.";
    pub const INVALID_DATETIME: &str =
        "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DD, YYYY-MM-DDThh:mm[:ss][+HH:MM|Z].";

    pub fn max_length(max: usize) -> String {
        format!("Ensure this field has no more than {} characters.", max)
    }

    pub fn min_value(min: i64) -> String {
        format!("Ensure this value is greater than or equal to {}.", min)
    }

    pub fn max_value(max: i64) -> String {
        format!("Ensure this value is less than or equal to {}.", max)
    }

    pub fn invalid_choice(value: &str) -> String {
        format!("\"{}\" is not a valid choice.", value)
    }

    pub fn does_not_exist(id: i64) -> String {
        format!("Invalid pk \"{}\" - object does not exist.", id)
    }
}

/// Deserializes a field that distinguishes "absent" from "explicit null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
