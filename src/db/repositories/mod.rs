//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod entry;
pub mod exercise;
pub mod stats;
pub mod user;
pub mod workout;

pub use entry::{EntryRepository, SqlxEntryRepository};
pub use exercise::{ExerciseRepository, SqlxExerciseRepository};
pub use stats::{SqlxStatsRepository, StatsRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use workout::{SqlxWorkoutRepository, WorkoutRepository};

/// Whether a repository error was caused by a unique constraint
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
    )
}
