//! Workout repository
//!
//! Every query takes the owning user's id and filters on it; a workout owned
//! by someone else is indistinguishable from one that does not exist.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{NewWorkout, Workout, WorkoutEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::entry::{row_to_entry_mysql, row_to_entry_sqlite, SELECT_ENTRY};

/// Workout repository trait
#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    /// Create a workout owned by `user_id`
    async fn create(&self, user_id: i64, workout: &NewWorkout) -> Result<Workout>;

    /// The user's workouts, newest first; equal dates by id descending
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Workout>>;

    async fn get_for_user(&self, user_id: i64, id: i64) -> Result<Option<Workout>>;

    /// Replace date, location and notes. Returns `None` if the user has no such workout.
    async fn update(&self, user_id: i64, id: i64, workout: &NewWorkout)
        -> Result<Option<Workout>>;

    /// Delete a workout and its entries. Returns `false` if the user has no such workout.
    async fn delete(&self, user_id: i64, id: i64) -> Result<bool>;

    /// Whether workout `id` exists and belongs to `user_id`
    async fn is_owned_by(&self, id: i64, user_id: i64) -> Result<bool>;
}

/// SQLx-based workout repository implementation
pub struct SqlxWorkoutRepository {
    pool: DynDatabasePool,
}

impl SqlxWorkoutRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn WorkoutRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl WorkoutRepository for SqlxWorkoutRepository {
    async fn create(&self, user_id: i64, workout: &NewWorkout) -> Result<Workout> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_workout_sqlite(self.pool.sqlite()?, user_id, workout).await
            }
            DatabaseDriver::Mysql => create_workout_mysql(self.pool.mysql()?, user_id, workout).await,
        }
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Workout>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_workouts_sqlite(self.pool.sqlite()?, user_id).await,
            DatabaseDriver::Mysql => list_workouts_mysql(self.pool.mysql()?, user_id).await,
        }
    }

    async fn get_for_user(&self, user_id: i64, id: i64) -> Result<Option<Workout>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_workout_sqlite(self.pool.sqlite()?, user_id, id).await,
            DatabaseDriver::Mysql => get_workout_mysql(self.pool.mysql()?, user_id, id).await,
        }
    }

    async fn update(
        &self,
        user_id: i64,
        id: i64,
        workout: &NewWorkout,
    ) -> Result<Option<Workout>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_workout_sqlite(self.pool.sqlite()?, user_id, id, workout).await
            }
            DatabaseDriver::Mysql => {
                update_workout_mysql(self.pool.mysql()?, user_id, id, workout).await
            }
        }
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_workout_sqlite(self.pool.sqlite()?, user_id, id).await,
            DatabaseDriver::Mysql => delete_workout_mysql(self.pool.mysql()?, user_id, id).await,
        }
    }

    async fn is_owned_by(&self, id: i64, user_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => is_owned_by_sqlite(self.pool.sqlite()?, id, user_id).await,
            DatabaseDriver::Mysql => is_owned_by_mysql(self.pool.mysql()?, id, user_id).await,
        }
    }
}

const SELECT_WORKOUT: &str = r#"
    SELECT w.id, w.user_id, u.username, w.performed_at, w.location, w.notes, w.created_at
    FROM workouts w
    JOIN users u ON u.id = w.user_id
"#;

/// Attach entries to their workouts, preserving entry order within each workout
fn attach_entries(workouts: &mut [Workout], entries: Vec<WorkoutEntry>) {
    let mut by_workout: HashMap<i64, Vec<WorkoutEntry>> = HashMap::new();
    for entry in entries {
        by_workout.entry(entry.workout_id).or_default().push(entry);
    }
    for workout in workouts.iter_mut() {
        workout.entries = by_workout.remove(&workout.id).unwrap_or_default();
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_workout_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    workout: &NewWorkout,
) -> Result<Workout> {
    let created_at = Utc::now().trunc_subsecs(0);

    let result = sqlx::query(
        r#"
        INSERT INTO workouts (user_id, performed_at, location, notes, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(workout.date.trunc_subsecs(0))
    .bind(&workout.location)
    .bind(&workout.notes)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to create workout")?;

    get_workout_sqlite(pool, user_id, result.last_insert_rowid())
        .await?
        .context("Workout vanished after insert")
}

async fn list_workouts_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<Workout>> {
    let rows = sqlx::query(&format!(
        "{} WHERE w.user_id = ? ORDER BY w.performed_at DESC, w.id DESC",
        SELECT_WORKOUT
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list workouts")?;

    let mut workouts: Vec<Workout> = rows.iter().map(row_to_workout_sqlite).collect();

    let entry_rows = sqlx::query(&format!("{} WHERE w.user_id = ? ORDER BY e.id", SELECT_ENTRY))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list workout entries")?;
    attach_entries(&mut workouts, entry_rows.iter().map(row_to_entry_sqlite).collect());

    Ok(workouts)
}

async fn get_workout_sqlite(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Option<Workout>> {
    let row = sqlx::query(&format!("{} WHERE w.id = ? AND w.user_id = ?", SELECT_WORKOUT))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get workout")?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut workout = row_to_workout_sqlite(&row);

    let entry_rows = sqlx::query(&format!("{} WHERE e.workout_id = ? ORDER BY e.id", SELECT_ENTRY))
        .bind(id)
        .fetch_all(pool)
        .await
        .context("Failed to get workout entries")?;
    workout.entries = entry_rows.iter().map(row_to_entry_sqlite).collect();

    Ok(Some(workout))
}

async fn update_workout_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    workout: &NewWorkout,
) -> Result<Option<Workout>> {
    let result = sqlx::query(
        r#"
        UPDATE workouts
        SET performed_at = ?, location = ?, notes = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(workout.date.trunc_subsecs(0))
    .bind(&workout.location)
    .bind(&workout.notes)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update workout")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_workout_sqlite(pool, user_id, id).await
}

async fn delete_workout_sqlite(pool: &SqlitePool, user_id: i64, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM workouts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete workout")?;

    Ok(result.rows_affected() > 0)
}

async fn is_owned_by_sqlite(pool: &SqlitePool, id: i64, user_id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM workouts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to check workout ownership")?;

    Ok(found.is_some())
}

fn row_to_workout_sqlite(row: &sqlx::sqlite::SqliteRow) -> Workout {
    Workout {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        date: row.get("performed_at"),
        location: row.get("location"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        entries: Vec::new(),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_workout_mysql(
    pool: &MySqlPool,
    user_id: i64,
    workout: &NewWorkout,
) -> Result<Workout> {
    let created_at = Utc::now().trunc_subsecs(0);

    let result = sqlx::query(
        r#"
        INSERT INTO workouts (user_id, performed_at, location, notes, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(workout.date.trunc_subsecs(0))
    .bind(&workout.location)
    .bind(&workout.notes)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to create workout")?;

    get_workout_mysql(pool, user_id, result.last_insert_id() as i64)
        .await?
        .context("Workout vanished after insert")
}

async fn list_workouts_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<Workout>> {
    let rows = sqlx::query(&format!(
        "{} WHERE w.user_id = ? ORDER BY w.performed_at DESC, w.id DESC",
        SELECT_WORKOUT
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list workouts")?;

    let mut workouts: Vec<Workout> = rows.iter().map(row_to_workout_mysql).collect();

    let entry_rows = sqlx::query(&format!("{} WHERE w.user_id = ? ORDER BY e.id", SELECT_ENTRY))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list workout entries")?;
    attach_entries(&mut workouts, entry_rows.iter().map(row_to_entry_mysql).collect());

    Ok(workouts)
}

async fn get_workout_mysql(pool: &MySqlPool, user_id: i64, id: i64) -> Result<Option<Workout>> {
    let row = sqlx::query(&format!("{} WHERE w.id = ? AND w.user_id = ?", SELECT_WORKOUT))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get workout")?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut workout = row_to_workout_mysql(&row);

    let entry_rows = sqlx::query(&format!("{} WHERE e.workout_id = ? ORDER BY e.id", SELECT_ENTRY))
        .bind(id)
        .fetch_all(pool)
        .await
        .context("Failed to get workout entries")?;
    workout.entries = entry_rows.iter().map(row_to_entry_mysql).collect();

    Ok(Some(workout))
}

async fn update_workout_mysql(
    pool: &MySqlPool,
    user_id: i64,
    id: i64,
    workout: &NewWorkout,
) -> Result<Option<Workout>> {
    // MySQL reports matched-but-unchanged rows as 0 affected, so check ownership first.
    if !is_owned_by_mysql(pool, id, user_id).await? {
        return Ok(None);
    }

    sqlx::query(
        r#"
        UPDATE workouts
        SET performed_at = ?, location = ?, notes = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(workout.date.trunc_subsecs(0))
    .bind(&workout.location)
    .bind(&workout.notes)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update workout")?;

    get_workout_mysql(pool, user_id, id).await
}

async fn delete_workout_mysql(pool: &MySqlPool, user_id: i64, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM workouts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete workout")?;

    Ok(result.rows_affected() > 0)
}

async fn is_owned_by_mysql(pool: &MySqlPool, id: i64, user_id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM workouts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to check workout ownership")?;

    Ok(found.is_some())
}

fn row_to_workout_mysql(row: &sqlx::mysql::MySqlRow) -> Workout {
    Workout {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        date: row.get("performed_at"),
        location: row.get("location"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        entries: Vec::new(),
    }
}
