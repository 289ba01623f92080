//! Exercise repository
//!
//! Database operations for the exercise catalog.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Exercise, ExerciseCategory, ExerciseType, NewExercise, Unit};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Exercise repository trait
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// All exercises ordered by id
    async fn list(&self) -> Result<Vec<Exercise>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Exercise>>;

    async fn create(&self, exercise: &NewExercise) -> Result<Exercise>;

    /// Replace every field of an exercise. Returns `None` if it does not exist.
    async fn update(&self, id: i64, exercise: &NewExercise) -> Result<Option<Exercise>>;

    /// Delete an exercise together with every entry that references it.
    ///
    /// Returns `false` if no such exercise existed.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based exercise repository implementation
pub struct SqlxExerciseRepository {
    pool: DynDatabasePool,
}

impl SqlxExerciseRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ExerciseRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ExerciseRepository for SqlxExerciseRepository {
    async fn list(&self) -> Result<Vec<Exercise>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_exercises_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => list_exercises_mysql(self.pool.mysql()?).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Exercise>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_exercise_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_exercise_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn create(&self, exercise: &NewExercise) -> Result<Exercise> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_exercise_sqlite(self.pool.sqlite()?, exercise).await,
            DatabaseDriver::Mysql => create_exercise_mysql(self.pool.mysql()?, exercise).await,
        }
    }

    async fn update(&self, id: i64, exercise: &NewExercise) -> Result<Option<Exercise>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_exercise_sqlite(self.pool.sqlite()?, id, exercise).await
            }
            DatabaseDriver::Mysql => update_exercise_mysql(self.pool.mysql()?, id, exercise).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_exercise_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_exercise_mysql(self.pool.mysql()?, id).await,
        }
    }
}

const SELECT_EXERCISE: &str = r#"
    SELECT id, name, category, exercise_type, unit, description, image, video, created_at, updated_at
    FROM exercises
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_exercises_sqlite(pool: &SqlitePool) -> Result<Vec<Exercise>> {
    let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_EXERCISE))
        .fetch_all(pool)
        .await
        .context("Failed to list exercises")?;

    rows.iter().map(row_to_exercise_sqlite).collect()
}

async fn get_exercise_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Exercise>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_EXERCISE))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get exercise by ID")?;

    row.as_ref().map(row_to_exercise_sqlite).transpose()
}

async fn create_exercise_sqlite(pool: &SqlitePool, exercise: &NewExercise) -> Result<Exercise> {
    let now = Utc::now().trunc_subsecs(0);

    let result = sqlx::query(
        r#"
        INSERT INTO exercises (name, category, exercise_type, unit, description, image, video, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&exercise.name)
    .bind(exercise.category.to_string())
    .bind(exercise.exercise_type.to_string())
    .bind(exercise.unit.to_string())
    .bind(&exercise.description)
    .bind(&exercise.image)
    .bind(&exercise.video)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create exercise")?;

    Ok(exercise_from_parts(result.last_insert_rowid(), exercise, now, now))
}

async fn update_exercise_sqlite(
    pool: &SqlitePool,
    id: i64,
    exercise: &NewExercise,
) -> Result<Option<Exercise>> {
    let now = Utc::now().trunc_subsecs(0);

    let result = sqlx::query(
        r#"
        UPDATE exercises
        SET name = ?, category = ?, exercise_type = ?, unit = ?, description = ?, image = ?, video = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&exercise.name)
    .bind(exercise.category.to_string())
    .bind(exercise.exercise_type.to_string())
    .bind(exercise.unit.to_string())
    .bind(&exercise.description)
    .bind(&exercise.image)
    .bind(&exercise.video)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update exercise")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_exercise_sqlite(pool, id).await
}

async fn delete_exercise_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM exercises WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete exercise")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_exercise_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Exercise> {
    let category: String = row.get("category");
    let exercise_type: String = row.get("exercise_type");
    let unit: String = row.get("unit");

    Ok(Exercise {
        id: row.get("id"),
        name: row.get("name"),
        category: ExerciseCategory::from_str(&category)
            .with_context(|| format!("Invalid category in database: {}", category))?,
        exercise_type: ExerciseType::from_str(&exercise_type)
            .with_context(|| format!("Invalid exercise type in database: {}", exercise_type))?,
        unit: Unit::from_str(&unit)
            .with_context(|| format!("Invalid unit in database: {}", unit))?,
        description: row.get("description"),
        image: row.get("image"),
        video: row.get("video"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_exercises_mysql(pool: &MySqlPool) -> Result<Vec<Exercise>> {
    let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_EXERCISE))
        .fetch_all(pool)
        .await
        .context("Failed to list exercises")?;

    rows.iter().map(row_to_exercise_mysql).collect()
}

async fn get_exercise_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Exercise>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_EXERCISE))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get exercise by ID")?;

    row.as_ref().map(row_to_exercise_mysql).transpose()
}

async fn create_exercise_mysql(pool: &MySqlPool, exercise: &NewExercise) -> Result<Exercise> {
    let now = Utc::now().trunc_subsecs(0);

    let result = sqlx::query(
        r#"
        INSERT INTO exercises (name, category, exercise_type, unit, description, image, video, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&exercise.name)
    .bind(exercise.category.to_string())
    .bind(exercise.exercise_type.to_string())
    .bind(exercise.unit.to_string())
    .bind(&exercise.description)
    .bind(&exercise.image)
    .bind(&exercise.video)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create exercise")?;

    Ok(exercise_from_parts(result.last_insert_id() as i64, exercise, now, now))
}

async fn update_exercise_mysql(
    pool: &MySqlPool,
    id: i64,
    exercise: &NewExercise,
) -> Result<Option<Exercise>> {
    // MySQL reports matched-but-unchanged rows as 0 affected, so check existence first.
    if get_exercise_mysql(pool, id).await?.is_none() {
        return Ok(None);
    }

    sqlx::query(
        r#"
        UPDATE exercises
        SET name = ?, category = ?, exercise_type = ?, unit = ?, description = ?, image = ?, video = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&exercise.name)
    .bind(exercise.category.to_string())
    .bind(exercise.exercise_type.to_string())
    .bind(exercise.unit.to_string())
    .bind(&exercise.description)
    .bind(&exercise.image)
    .bind(&exercise.video)
    .bind(Utc::now().trunc_subsecs(0))
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update exercise")?;

    get_exercise_mysql(pool, id).await
}

async fn delete_exercise_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM exercises WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete exercise")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_exercise_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Exercise> {
    let category: String = row.get("category");
    let exercise_type: String = row.get("exercise_type");
    let unit: String = row.get("unit");

    Ok(Exercise {
        id: row.get("id"),
        name: row.get("name"),
        category: ExerciseCategory::from_str(&category)
            .with_context(|| format!("Invalid category in database: {}", category))?,
        exercise_type: ExerciseType::from_str(&exercise_type)
            .with_context(|| format!("Invalid exercise type in database: {}", exercise_type))?,
        unit: Unit::from_str(&unit)
            .with_context(|| format!("Invalid unit in database: {}", unit))?,
        description: row.get("description"),
        image: row.get("image"),
        video: row.get("video"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn exercise_from_parts(
    id: i64,
    exercise: &NewExercise,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> Exercise {
    Exercise {
        id,
        name: exercise.name.clone(),
        category: exercise.category,
        exercise_type: exercise.exercise_type,
        unit: exercise.unit,
        description: exercise.description.clone(),
        image: exercise.image.clone(),
        video: exercise.video.clone(),
        created_at,
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxExerciseRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxExerciseRepository::new(pool.clone());
        (pool, repo)
    }

    fn bench_press() -> NewExercise {
        NewExercise {
            name: "Bench Press".to_string(),
            category: ExerciseCategory::Chest,
            exercise_type: ExerciseType::Strength,
            unit: Unit::Reps,
            description: Some("Flat barbell press".to_string()),
            image: Some("bench.png".to_string()),
            video: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_exercise() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo.create(&bench_press()).await.expect("Failed to create");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get")
            .expect("Exercise not found");

        assert_eq!(found, created);
        assert_eq!(found.category, ExerciseCategory::Chest);
        assert_eq!(found.unit, Unit::Reps);
    }

    #[tokio::test]
    async fn test_list_ordered_by_id() {
        let (_pool, repo) = setup_test_repo().await;

        let first = repo.create(&bench_press()).await.unwrap();
        let mut run = bench_press();
        run.name = "Running".to_string();
        run.category = ExerciseCategory::Cardio;
        run.exercise_type = ExerciseType::Cardio;
        run.unit = Unit::Km;
        let second = repo.create(&run).await.unwrap();

        let all = repo.list().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(all[1].unit, Unit::Km);
    }

    #[tokio::test]
    async fn test_update_exercise() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&bench_press()).await.unwrap();

        let mut changed = bench_press();
        changed.name = "Incline Bench Press".to_string();
        changed.description = None;

        let updated = repo
            .update(created.id, &changed)
            .await
            .unwrap()
            .expect("Exercise should exist");

        assert_eq!(updated.name, "Incline Bench Press");
        assert_eq!(updated.description, None);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let (_pool, repo) = setup_test_repo().await;
        assert!(repo.update(42, &bench_press()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_exercise() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&bench_press()).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
