//! Statistics repository
//!
//! Read-only aggregate queries over a single user's workouts and entries.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{DailyCount, ExerciseFrequency};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Statistics repository trait
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn count_workouts(&self, user_id: i64) -> Result<i64>;

    async fn count_entries(&self, user_id: i64) -> Result<i64>;

    /// Workouts per UTC calendar day on or after `since`, ascending; empty days omitted
    async fn workouts_per_day(&self, user_id: i64, since: NaiveDate) -> Result<Vec<DailyCount>>;

    /// Most-logged exercises by entry count; ties go to the exercise logged first
    async fn top_exercises(&self, user_id: i64, limit: i64) -> Result<Vec<ExerciseFrequency>>;
}

/// SQLx-based statistics repository implementation
pub struct SqlxStatsRepository {
    pool: DynDatabasePool,
}

impl SqlxStatsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StatsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl StatsRepository for SqlxStatsRepository {
    async fn count_workouts(&self, user_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_workouts_sqlite(self.pool.sqlite()?, user_id).await,
            DatabaseDriver::Mysql => count_workouts_mysql(self.pool.mysql()?, user_id).await,
        }
    }

    async fn count_entries(&self, user_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_entries_sqlite(self.pool.sqlite()?, user_id).await,
            DatabaseDriver::Mysql => count_entries_mysql(self.pool.mysql()?, user_id).await,
        }
    }

    async fn workouts_per_day(&self, user_id: i64, since: NaiveDate) -> Result<Vec<DailyCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                workouts_per_day_sqlite(self.pool.sqlite()?, user_id, since).await
            }
            DatabaseDriver::Mysql => {
                workouts_per_day_mysql(self.pool.mysql()?, user_id, since).await
            }
        }
    }

    async fn top_exercises(&self, user_id: i64, limit: i64) -> Result<Vec<ExerciseFrequency>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => top_exercises_sqlite(self.pool.sqlite()?, user_id, limit).await,
            DatabaseDriver::Mysql => top_exercises_mysql(self.pool.mysql()?, user_id, limit).await,
        }
    }
}

const COUNT_WORKOUTS: &str = "SELECT COUNT(*) FROM workouts WHERE user_id = ?";

const COUNT_ENTRIES: &str = r#"
    SELECT COUNT(*)
    FROM workout_entries e
    JOIN workouts w ON w.id = e.workout_id
    WHERE w.user_id = ?
"#;

const WORKOUTS_PER_DAY: &str = r#"
    SELECT DATE(performed_at) AS day, COUNT(*) AS workout_count
    FROM workouts
    WHERE user_id = ? AND DATE(performed_at) >= ?
    GROUP BY DATE(performed_at)
    ORDER BY day
"#;

const TOP_EXERCISES: &str = r#"
    SELECT x.name AS name, COUNT(*) AS entry_count
    FROM workout_entries e
    JOIN workouts w ON w.id = e.workout_id
    JOIN exercises x ON x.id = e.exercise_id
    WHERE w.user_id = ?
    GROUP BY x.id, x.name
    ORDER BY entry_count DESC, MIN(e.id) ASC
    LIMIT ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn count_workouts_sqlite(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    sqlx::query_scalar(COUNT_WORKOUTS)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count workouts")
}

async fn count_entries_sqlite(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    sqlx::query_scalar(COUNT_ENTRIES)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count entries")
}

async fn workouts_per_day_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    since: NaiveDate,
) -> Result<Vec<DailyCount>> {
    let rows = sqlx::query(WORKOUTS_PER_DAY)
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await
        .context("Failed to count workouts per day")?;

    // SQLite's DATE() yields text
    rows.iter()
        .map(|row| {
            let day: String = row.get("day");
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .with_context(|| format!("Invalid workout date in database: {}", day))?;
            Ok(DailyCount {
                date,
                count: row.get("workout_count"),
            })
        })
        .collect()
}

async fn top_exercises_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ExerciseFrequency>> {
    let rows = sqlx::query(TOP_EXERCISES)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to rank exercises")?;

    Ok(rows
        .iter()
        .map(|row| ExerciseFrequency {
            exercise: row.get("name"),
            count: row.get("entry_count"),
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn count_workouts_mysql(pool: &MySqlPool, user_id: i64) -> Result<i64> {
    sqlx::query_scalar(COUNT_WORKOUTS)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count workouts")
}

async fn count_entries_mysql(pool: &MySqlPool, user_id: i64) -> Result<i64> {
    sqlx::query_scalar(COUNT_ENTRIES)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count entries")
}

async fn workouts_per_day_mysql(
    pool: &MySqlPool,
    user_id: i64,
    since: NaiveDate,
) -> Result<Vec<DailyCount>> {
    let rows = sqlx::query(WORKOUTS_PER_DAY)
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await
        .context("Failed to count workouts per day")?;

    Ok(rows
        .iter()
        .map(|row| DailyCount {
            date: row.get("day"),
            count: row.get("workout_count"),
        })
        .collect())
}

async fn top_exercises_mysql(
    pool: &MySqlPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ExerciseFrequency>> {
    let rows = sqlx::query(TOP_EXERCISES)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to rank exercises")?;

    Ok(rows
        .iter()
        .map(|row| ExerciseFrequency {
            exercise: row.get("name"),
            count: row.get("entry_count"),
        })
        .collect())
}
