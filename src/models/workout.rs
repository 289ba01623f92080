//! Workout model
//!
//! A workout is a dated session owned by exactly one user. The owner is never
//! taken from request bodies.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::WorkoutEntry;

/// Location used when none is given
pub const DEFAULT_LOCATION: &str = "Gym";

/// Workout entity, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    #[serde(skip_serializing, default)]
    pub user_id: i64,
    /// Owner's username
    #[serde(rename = "user")]
    pub username: String,
    /// When the session took place
    pub date: DateTime<Utc>,
    pub location: String,
    pub notes: Option<String>,
    /// Set once by the server
    pub created_at: DateTime<Utc>,
    pub entries: Vec<WorkoutEntry>,
}

/// Validated workout fields, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub date: DateTime<Utc>,
    pub location: String,
    pub notes: Option<String>,
}

impl From<&Workout> for NewWorkout {
    fn from(workout: &Workout) -> Self {
        Self {
            date: workout.date,
            location: workout.location.clone(),
            notes: workout.notes.clone(),
        }
    }
}

/// Request body for create, full update and partial update.
///
/// Any owner field in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkoutInput {
    #[serde(default)]
    pub date: Option<String>,
    /// Absent means the default location; an explicit `null` is rejected
    #[serde(default, deserialize_with = "super::nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

impl WorkoutInput {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(Some(location.into()));
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(Some(notes.into()));
        self
    }
}

/// Parse a workout date.
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`, any offset), a naive date-time
/// taken as UTC (`2024-01-01T10:00[:SS]`, `T` or space separated) or a bare
/// date taken as midnight UTC. Sub-second precision is dropped.
pub fn parse_workout_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        dt.with_timezone(&Utc)
    } else if let Some(naive) = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        naive.and_utc()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
    };

    Some(parsed.trunc_subsecs(0))
}
