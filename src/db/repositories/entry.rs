//! Workout entry repository
//!
//! Entries are reached through their parent workout: every user-scoped query
//! joins `workouts` and filters on `workouts.user_id`.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{NewEntry, WorkoutEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Workout entry repository trait
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Entries in the user's workouts ordered by id, optionally limited to one workout
    async fn list_for_user(&self, user_id: i64, workout_id: Option<i64>)
        -> Result<Vec<WorkoutEntry>>;

    async fn get_for_user(&self, user_id: i64, id: i64) -> Result<Option<WorkoutEntry>>;

    /// Insert an entry. Ownership of the target workout is checked by the caller.
    async fn create(&self, entry: &NewEntry) -> Result<WorkoutEntry>;

    /// Replace every field of an entry the user owns. Returns `None` otherwise.
    async fn update(&self, user_id: i64, id: i64, entry: &NewEntry)
        -> Result<Option<WorkoutEntry>>;

    /// Returns `false` if the user owns no such entry.
    async fn delete(&self, user_id: i64, id: i64) -> Result<bool>;
}

/// SQLx-based workout entry repository implementation
pub struct SqlxEntryRepository {
    pool: DynDatabasePool,
}

impl SqlxEntryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EntryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EntryRepository for SqlxEntryRepository {
    async fn list_for_user(
        &self,
        user_id: i64,
        workout_id: Option<i64>,
    ) -> Result<Vec<WorkoutEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_entries_sqlite(self.pool.sqlite()?, user_id, workout_id).await
            }
            DatabaseDriver::Mysql => {
                list_entries_mysql(self.pool.mysql()?, user_id, workout_id).await
            }
        }
    }

    async fn get_for_user(&self, user_id: i64, id: i64) -> Result<Option<WorkoutEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_entry_sqlite(self.pool.sqlite()?, user_id, id).await,
            DatabaseDriver::Mysql => get_entry_mysql(self.pool.mysql()?, user_id, id).await,
        }
    }

    async fn create(&self, entry: &NewEntry) -> Result<WorkoutEntry> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_entry_sqlite(self.pool.sqlite()?, entry).await,
            DatabaseDriver::Mysql => create_entry_mysql(self.pool.mysql()?, entry).await,
        }
    }

    async fn update(
        &self,
        user_id: i64,
        id: i64,
        entry: &NewEntry,
    ) -> Result<Option<WorkoutEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_entry_sqlite(self.pool.sqlite()?, user_id, id, entry).await
            }
            DatabaseDriver::Mysql => update_entry_mysql(self.pool.mysql()?, user_id, id, entry).await,
        }
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_entry_sqlite(self.pool.sqlite()?, user_id, id).await,
            DatabaseDriver::Mysql => delete_entry_mysql(self.pool.mysql()?, user_id, id).await,
        }
    }
}

/// Entry columns with the exercise name and image joined in.
/// Callers append a `WHERE` on `e.*` or `w.*` and an `ORDER BY`.
pub(super) const SELECT_ENTRY: &str = r#"
    SELECT e.id, e.workout_id, e.exercise_id, x.name AS exercise_name, x.image AS exercise_image,
           e.sets, e.quantity, e.weight, e.rest_seconds
    FROM workout_entries e
    JOIN workouts w ON w.id = e.workout_id
    JOIN exercises x ON x.id = e.exercise_id
"#;

const OWNED_ENTRY_FILTER: &str =
    "workout_id IN (SELECT id FROM workouts WHERE user_id = ?)";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_entries_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    workout_id: Option<i64>,
) -> Result<Vec<WorkoutEntry>> {
    let rows = match workout_id {
        Some(workout_id) => {
            sqlx::query(&format!(
                "{} WHERE w.user_id = ? AND e.workout_id = ? ORDER BY e.id",
                SELECT_ENTRY
            ))
            .bind(user_id)
            .bind(workout_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!("{} WHERE w.user_id = ? ORDER BY e.id", SELECT_ENTRY))
                .bind(user_id)
                .fetch_all(pool)
                .await
        }
    }
    .context("Failed to list entries")?;

    Ok(rows.iter().map(row_to_entry_sqlite).collect())
}

async fn get_entry_sqlite(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Option<WorkoutEntry>> {
    let row = sqlx::query(&format!("{} WHERE e.id = ? AND w.user_id = ?", SELECT_ENTRY))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry")?;

    Ok(row.as_ref().map(row_to_entry_sqlite))
}

async fn get_entry_unscoped_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<WorkoutEntry>> {
    let row = sqlx::query(&format!("{} WHERE e.id = ?", SELECT_ENTRY))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry")?;

    Ok(row.as_ref().map(row_to_entry_sqlite))
}

async fn create_entry_sqlite(pool: &SqlitePool, entry: &NewEntry) -> Result<WorkoutEntry> {
    let result = sqlx::query(
        r#"
        INSERT INTO workout_entries (workout_id, exercise_id, sets, quantity, weight, rest_seconds)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.workout_id)
    .bind(entry.exercise_id)
    .bind(entry.sets)
    .bind(entry.quantity)
    .bind(entry.weight)
    .bind(entry.rest_seconds)
    .execute(pool)
    .await
    .context("Failed to create entry")?;

    get_entry_unscoped_sqlite(pool, result.last_insert_rowid())
        .await?
        .context("Entry vanished after insert")
}

async fn update_entry_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    entry: &NewEntry,
) -> Result<Option<WorkoutEntry>> {
    let result = sqlx::query(&format!(
        r#"
        UPDATE workout_entries
        SET workout_id = ?, exercise_id = ?, sets = ?, quantity = ?, weight = ?, rest_seconds = ?
        WHERE id = ? AND {}
        "#,
        OWNED_ENTRY_FILTER
    ))
    .bind(entry.workout_id)
    .bind(entry.exercise_id)
    .bind(entry.sets)
    .bind(entry.quantity)
    .bind(entry.weight)
    .bind(entry.rest_seconds)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update entry")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_entry_sqlite(pool, user_id, id).await
}

async fn delete_entry_sqlite(pool: &SqlitePool, user_id: i64, id: i64) -> Result<bool> {
    let result = sqlx::query(&format!(
        "DELETE FROM workout_entries WHERE id = ? AND {}",
        OWNED_ENTRY_FILTER
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to delete entry")?;

    Ok(result.rows_affected() > 0)
}

pub(super) fn row_to_entry_sqlite(row: &sqlx::sqlite::SqliteRow) -> WorkoutEntry {
    WorkoutEntry {
        id: row.get("id"),
        workout_id: row.get("workout_id"),
        exercise_id: row.get("exercise_id"),
        exercise_name: row.get("exercise_name"),
        exercise_image: row.get("exercise_image"),
        sets: row.get("sets"),
        quantity: row.get("quantity"),
        weight: row.get("weight"),
        rest_seconds: row.get("rest_seconds"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_entries_mysql(
    pool: &MySqlPool,
    user_id: i64,
    workout_id: Option<i64>,
) -> Result<Vec<WorkoutEntry>> {
    let rows = match workout_id {
        Some(workout_id) => {
            sqlx::query(&format!(
                "{} WHERE w.user_id = ? AND e.workout_id = ? ORDER BY e.id",
                SELECT_ENTRY
            ))
            .bind(user_id)
            .bind(workout_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!("{} WHERE w.user_id = ? ORDER BY e.id", SELECT_ENTRY))
                .bind(user_id)
                .fetch_all(pool)
                .await
        }
    }
    .context("Failed to list entries")?;

    Ok(rows.iter().map(row_to_entry_mysql).collect())
}

async fn get_entry_mysql(pool: &MySqlPool, user_id: i64, id: i64) -> Result<Option<WorkoutEntry>> {
    let row = sqlx::query(&format!("{} WHERE e.id = ? AND w.user_id = ?", SELECT_ENTRY))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry")?;

    Ok(row.as_ref().map(row_to_entry_mysql))
}

async fn get_entry_unscoped_mysql(pool: &MySqlPool, id: i64) -> Result<Option<WorkoutEntry>> {
    let row = sqlx::query(&format!("{} WHERE e.id = ?", SELECT_ENTRY))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry")?;

    Ok(row.as_ref().map(row_to_entry_mysql))
}

async fn create_entry_mysql(pool: &MySqlPool, entry: &NewEntry) -> Result<WorkoutEntry> {
    let result = sqlx::query(
        r#"
        INSERT INTO workout_entries (workout_id, exercise_id, sets, quantity, weight, rest_seconds)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.workout_id)
    .bind(entry.exercise_id)
    .bind(entry.sets)
    .bind(entry.quantity)
    .bind(entry.weight)
    .bind(entry.rest_seconds)
    .execute(pool)
    .await
    .context("Failed to create entry")?;

    get_entry_unscoped_mysql(pool, result.last_insert_id() as i64)
        .await?
        .context("Entry vanished after insert")
}

async fn update_entry_mysql(
    pool: &MySqlPool,
    user_id: i64,
    id: i64,
    entry: &NewEntry,
) -> Result<Option<WorkoutEntry>> {
    // MySQL reports matched-but-unchanged rows as 0 affected, so check ownership first.
    if get_entry_mysql(pool, user_id, id).await?.is_none() {
        return Ok(None);
    }

    sqlx::query(&format!(
        r#"
        UPDATE workout_entries
        SET workout_id = ?, exercise_id = ?, sets = ?, quantity = ?, weight = ?, rest_seconds = ?
        WHERE id = ? AND {}
        "#,
        OWNED_ENTRY_FILTER
    ))
    .bind(entry.workout_id)
    .bind(entry.exercise_id)
    .bind(entry.sets)
    .bind(entry.quantity)
    .bind(entry.weight)
    .bind(entry.rest_seconds)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to update entry")?;

    get_entry_mysql(pool, user_id, id).await
}

async fn delete_entry_mysql(pool: &MySqlPool, user_id: i64, id: i64) -> Result<bool> {
    let result = sqlx::query(&format!(
        "DELETE FROM workout_entries WHERE id = ? AND {}",
        OWNED_ENTRY_FILTER
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to delete entry")?;

    Ok(result.rows_affected() > 0)
}

pub(super) fn row_to_entry_mysql(row: &sqlx::mysql::MySqlRow) -> WorkoutEntry {
    WorkoutEntry {
        id: row.get("id"),
        workout_id: row.get("workout_id"),
        exercise_id: row.get("exercise_id"),
        exercise_name: row.get("exercise_name"),
        exercise_image: row.get("exercise_image"),
        sets: row.get::<i32, _>("sets") as i64,
        quantity: row.get("quantity"),
        weight: row.get("weight"),
        rest_seconds: row.get::<Option<i32>, _>("rest_seconds").map(i64::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_exercise, seed_user, seed_workout};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxEntryRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxEntryRepository::new(pool.clone());
        (pool, repo)
    }

    fn entry(workout_id: i64, exercise_id: i64) -> NewEntry {
        NewEntry {
            workout_id,
            exercise_id,
            sets: 3,
            quantity: 10.0,
            weight: 80.0,
            rest_seconds: Some(90),
        }
    }

    #[tokio::test]
    async fn test_create_entry_denormalizes_exercise() {
        let (pool, repo) = setup_test_repo().await;
        let alice = seed_user(&pool, "alice").await;
        let bench = seed_exercise(&pool, "Bench Press").await;
        let workout = seed_workout(&pool, alice).await;

        let created = repo.create(&entry(workout, bench)).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.workout_id, workout);
        assert_eq!(created.exercise_name, "Bench Press");
        assert_eq!(created.sets, 3);
        assert_eq!(created.quantity, 10.0);
        assert_eq!(created.weight, 80.0);
        assert_eq!(created.rest_seconds, Some(90));
    }

    #[tokio::test]
    async fn test_entries_scoped_through_workout() {
        let (pool, repo) = setup_test_repo().await;
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let bench = seed_exercise(&pool, "Bench Press").await;
        let alice_workout = seed_workout(&pool, alice).await;
        let bob_workout = seed_workout(&pool, bob).await;

        let mine = repo.create(&entry(alice_workout, bench)).await.unwrap();
        repo.create(&entry(bob_workout, bench)).await.unwrap();

        let listed = repo.list_for_user(alice, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);

        assert!(repo.get_for_user(bob, mine.id).await.unwrap().is_none());
        assert!(repo.update(bob, mine.id, &entry(bob_workout, bench)).await.unwrap().is_none());
        assert!(!repo.delete(bob, mine.id).await.unwrap());
        assert!(repo.get_for_user(alice, mine.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_filtered_by_workout() {
        let (pool, repo) = setup_test_repo().await;
        let alice = seed_user(&pool, "alice").await;
        let bench = seed_exercise(&pool, "Bench Press").await;
        let first = seed_workout(&pool, alice).await;
        let second = seed_workout(&pool, alice).await;

        repo.create(&entry(first, bench)).await.unwrap();
        repo.create(&entry(second, bench)).await.unwrap();
        repo.create(&entry(second, bench)).await.unwrap();

        assert_eq!(repo.list_for_user(alice, Some(first)).await.unwrap().len(), 1);
        assert_eq!(repo.list_for_user(alice, Some(second)).await.unwrap().len(), 2);
        assert_eq!(repo.list_for_user(alice, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_entry() {
        let (pool, repo) = setup_test_repo().await;
        let alice = seed_user(&pool, "alice").await;
        let bench = seed_exercise(&pool, "Bench Press").await;
        let squat = seed_exercise(&pool, "Squat").await;
        let workout = seed_workout(&pool, alice).await;
        let created = repo.create(&entry(workout, bench)).await.unwrap();

        let mut changed = entry(workout, squat);
        changed.rest_seconds = None;
        changed.quantity = 12.5;

        let updated = repo
            .update(alice, created.id, &changed)
            .await
            .unwrap()
            .expect("Owner update should succeed");

        assert_eq!(updated.exercise_name, "Squat");
        assert_eq!(updated.quantity, 12.5);
        assert_eq!(updated.rest_seconds, None);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let (pool, repo) = setup_test_repo().await;
        let alice = seed_user(&pool, "alice").await;
        let bench = seed_exercise(&pool, "Bench Press").await;
        let workout = seed_workout(&pool, alice).await;
        let created = repo.create(&entry(workout, bench)).await.unwrap();

        assert!(repo.delete(alice, created.id).await.unwrap());
        assert!(repo.list_for_user(alice, None).await.unwrap().is_empty());
    }
}
