//! Statistics payload
//!
//! Field names on the wire are kept stable for existing dashboard clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-user aggregate figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "total_entrenamientos")]
    pub total_workouts: i64,
    #[serde(rename = "total_ejercicios_registrados")]
    pub total_entries: i64,
    /// Workouts per day over the trailing four weeks, oldest first
    #[serde(rename = "entrenamientos_chart")]
    pub workouts_per_day: Vec<DailyCount>,
    /// Up to five most-logged exercises
    #[serde(rename = "ejercicios_frecuentes")]
    pub top_exercises: Vec<ExerciseFrequency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseFrequency {
    #[serde(rename = "ejercicio")]
    pub exercise: String,
    pub count: i64,
}
