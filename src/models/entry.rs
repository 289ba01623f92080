//! Workout entry model
//!
//! One exercise performed within a workout. Entries have no owner column of
//! their own; ownership always goes through the parent workout.

use serde::{Deserialize, Serialize};

/// Workout entry, with the exercise's name and image copied in for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: i64,
    #[serde(rename = "workout")]
    pub workout_id: i64,
    #[serde(rename = "exercise")]
    pub exercise_id: i64,
    pub exercise_name: String,
    pub exercise_image: Option<String>,
    pub sets: i64,
    /// Reps, minutes, km or kcal depending on the exercise's unit
    pub quantity: f64,
    /// Kilograms
    pub weight: f64,
    pub rest_seconds: Option<i64>,
}

/// Validated entry fields, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub sets: i64,
    pub quantity: f64,
    pub weight: f64,
    pub rest_seconds: Option<i64>,
}

impl From<&WorkoutEntry> for NewEntry {
    fn from(entry: &WorkoutEntry) -> Self {
        Self {
            workout_id: entry.workout_id,
            exercise_id: entry.exercise_id,
            sets: entry.sets,
            quantity: entry.quantity,
            weight: entry.weight,
            rest_seconds: entry.rest_seconds,
        }
    }
}

/// Request body for create, full update and partial update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryInput {
    #[serde(default)]
    pub workout: Option<i64>,
    #[serde(default)]
    pub exercise: Option<i64>,
    #[serde(default)]
    pub sets: Option<i64>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub rest_seconds: Option<Option<i64>>,
}

impl EntryInput {
    pub fn new(workout: i64, exercise: i64, quantity: f64) -> Self {
        Self {
            workout: Some(workout),
            exercise: Some(exercise),
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    pub fn with_sets(mut self, sets: i64) -> Self {
        self.sets = Some(sets);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_rest(mut self, seconds: i64) -> Self {
        self.rest_seconds = Some(Some(seconds));
        self
    }
}
