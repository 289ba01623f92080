//! Exercise model
//!
//! Catalog entries shared by every user. Category, type and unit are closed
//! sets; their `Display` form is what gets stored and serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Muscle group / area an exercise belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseCategory {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Cardio,
    Core,
    Other,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 8] = [
        ExerciseCategory::Chest,
        ExerciseCategory::Back,
        ExerciseCategory::Legs,
        ExerciseCategory::Shoulders,
        ExerciseCategory::Arms,
        ExerciseCategory::Cardio,
        ExerciseCategory::Core,
        ExerciseCategory::Other,
    ];
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseCategory::Chest => write!(f, "Chest"),
            ExerciseCategory::Back => write!(f, "Back"),
            ExerciseCategory::Legs => write!(f, "Legs"),
            ExerciseCategory::Shoulders => write!(f, "Shoulders"),
            ExerciseCategory::Arms => write!(f, "Arms"),
            ExerciseCategory::Cardio => write!(f, "Cardio"),
            ExerciseCategory::Core => write!(f, "Core"),
            ExerciseCategory::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for ExerciseCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chest" => Ok(ExerciseCategory::Chest),
            "back" => Ok(ExerciseCategory::Back),
            "legs" => Ok(ExerciseCategory::Legs),
            "shoulders" => Ok(ExerciseCategory::Shoulders),
            "arms" => Ok(ExerciseCategory::Arms),
            "cardio" => Ok(ExerciseCategory::Cardio),
            "core" => Ok(ExerciseCategory::Core),
            "other" => Ok(ExerciseCategory::Other),
            _ => Err(anyhow::anyhow!("Invalid exercise category: {}", s)),
        }
    }
}

/// Training modality of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseType {
    Strength,
    Cardio,
    Calisthenics,
    Yoga,
    Flexibility,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 5] = [
        ExerciseType::Strength,
        ExerciseType::Cardio,
        ExerciseType::Calisthenics,
        ExerciseType::Yoga,
        ExerciseType::Flexibility,
    ];
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseType::Strength => write!(f, "Strength"),
            ExerciseType::Cardio => write!(f, "Cardio"),
            ExerciseType::Calisthenics => write!(f, "Calisthenics"),
            ExerciseType::Yoga => write!(f, "Yoga"),
            ExerciseType::Flexibility => write!(f, "Flexibility"),
        }
    }
}

impl FromStr for ExerciseType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strength" => Ok(ExerciseType::Strength),
            "cardio" => Ok(ExerciseType::Cardio),
            "calisthenics" => Ok(ExerciseType::Calisthenics),
            "yoga" => Ok(ExerciseType::Yoga),
            "flexibility" => Ok(ExerciseType::Flexibility),
            _ => Err(anyhow::anyhow!("Invalid exercise type: {}", s)),
        }
    }
}

/// What a logged quantity counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Reps,
    Minutes,
    Km,
    Kcal,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Reps, Unit::Minutes, Unit::Km, Unit::Kcal];
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Reps => write!(f, "reps"),
            Unit::Minutes => write!(f, "minutes"),
            Unit::Km => write!(f, "km"),
            Unit::Kcal => write!(f, "kcal"),
        }
    }
}

impl FromStr for Unit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reps" => Ok(Unit::Reps),
            "minutes" => Ok(Unit::Minutes),
            "km" => Ok(Unit::Km),
            "kcal" => Ok(Unit::Kcal),
            _ => Err(anyhow::anyhow!("Invalid unit: {}", s)),
        }
    }
}

/// Exercise entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub category: ExerciseCategory,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub unit: Unit,
    pub description: Option<String>,
    /// Image filename
    pub image: Option<String>,
    /// Video filename
    pub video: Option<String>,
    #[serde(skip_serializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing, default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Validated exercise fields, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub category: ExerciseCategory,
    pub exercise_type: ExerciseType,
    pub unit: Unit,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
}

impl From<&Exercise> for NewExercise {
    fn from(exercise: &Exercise) -> Self {
        Self {
            name: exercise.name.clone(),
            category: exercise.category,
            exercise_type: exercise.exercise_type,
            unit: exercise.unit,
            description: exercise.description.clone(),
            image: exercise.image.clone(),
            video: exercise.video.clone(),
        }
    }
}

/// Request body for create, full update and partial update.
///
/// Choice fields arrive as strings so that unknown values can be reported
/// per field instead of rejecting the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub exercise_type: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub video: Option<Option<String>>,
}

impl ExerciseInput {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        exercise_type: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            category: Some(category.into()),
            exercise_type: Some(exercise_type.into()),
            unit: Some(unit.into()),
            ..Default::default()
        }
    }
}
