//! Database migrations module
//!
//! This module provides code-based database migrations for Fitlog.
//! All migrations are embedded directly in Rust code as SQL strings, supporting
//! both SQLite and MySQL databases for single-binary deployment.
//!
//! # Usage
//!
//! ```ignore
//! use fitlog::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Each migration is a [`Migration`] holding a version, a name and the SQL
//! for both backends. Applied versions are tracked in `_migrations`.
//!
//! Every foreign key is declared `ON DELETE CASCADE`: deleting a user removes
//! their workouts, deleting a workout removes its entries, and deleting an
//! exercise removes the entries that reference it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_exercises",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                category VARCHAR(20) NOT NULL,
                exercise_type VARCHAR(20) NOT NULL,
                unit VARCHAR(10) NOT NULL DEFAULT 'reps',
                description TEXT,
                image VARCHAR(255),
                video VARCHAR(255),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_exercises_name ON exercises(name);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS exercises (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                category VARCHAR(20) NOT NULL,
                exercise_type VARCHAR(20) NOT NULL,
                unit VARCHAR(10) NOT NULL DEFAULT 'reps',
                description TEXT,
                image VARCHAR(255),
                video VARCHAR(255),
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_exercises_name ON exercises(name);
        "#,
    },
    Migration {
        version: 3,
        name: "create_workouts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                performed_at TIMESTAMP NOT NULL,
                location VARCHAR(100) NOT NULL DEFAULT 'Gym',
                notes TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_workouts_user_performed ON workouts(user_id, performed_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS workouts (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                user_id BIGINT NOT NULL,
                performed_at DATETIME NOT NULL,
                location VARCHAR(100) NOT NULL DEFAULT 'Gym',
                notes TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_workouts_user_performed ON workouts(user_id, performed_at);
        "#,
    },
    Migration {
        version: 4,
        name: "create_workout_entries",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS workout_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id INTEGER NOT NULL,
                exercise_id INTEGER NOT NULL,
                sets INTEGER NOT NULL DEFAULT 1,
                quantity REAL NOT NULL,
                weight REAL NOT NULL DEFAULT 0,
                rest_seconds INTEGER,
                FOREIGN KEY (workout_id) REFERENCES workouts(id) ON DELETE CASCADE,
                FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_workout_entries_workout_id ON workout_entries(workout_id);
            CREATE INDEX IF NOT EXISTS idx_workout_entries_exercise_id ON workout_entries(exercise_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS workout_entries (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                workout_id BIGINT NOT NULL,
                exercise_id BIGINT NOT NULL,
                sets INT NOT NULL DEFAULT 1,
                quantity DOUBLE NOT NULL,
                weight DOUBLE NOT NULL DEFAULT 0,
                rest_seconds INT,
                FOREIGN KEY (workout_id) REFERENCES workouts(id) ON DELETE CASCADE,
                FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_workout_entries_workout_id ON workout_entries(workout_id);
            CREATE INDEX idx_workout_entries_exercise_id ON workout_entries(exercise_id);
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.sqlite()?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.mysql()?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .into_iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .into_iter()
        .map(|row| MigrationRecord {
            version: row.get::<i32, _>("version") as i64,
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.sqlite()?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.mysql()?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping blanks and comment-only chunks
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn insert_user(pool: &SqlitePool, username: &str) -> i64 {
        sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
            .bind(username)
            .bind("")
            .bind("hash")
            .execute(pool)
            .await
            .expect("Failed to insert user")
            .last_insert_rowid()
    }

    async fn insert_exercise(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO exercises (name, category, exercise_type) VALUES (?, 'Chest', 'Strength')")
            .bind(name)
            .execute(pool)
            .await
            .expect("Failed to insert exercise")
            .last_insert_rowid()
    }

    async fn insert_workout(pool: &SqlitePool, user_id: i64) -> i64 {
        sqlx::query("INSERT INTO workouts (user_id, performed_at) VALUES (?, '2024-01-01T10:00:00+00:00')")
            .bind(user_id)
            .execute(pool)
            .await
            .expect("Failed to insert workout")
            .last_insert_rowid()
    }

    async fn insert_entry(pool: &SqlitePool, workout_id: i64, exercise_id: i64) -> i64 {
        sqlx::query("INSERT INTO workout_entries (workout_id, exercise_id, quantity) VALUES (?, ?, 10)")
            .bind(workout_id)
            .bind(exercise_id)
            .execute(pool)
            .await
            .expect("Failed to insert entry")
            .last_insert_rowid()
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .expect("Failed to count rows")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_pending_count_and_up_to_date() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());
        assert!(!is_up_to_date(&pool).await.unwrap());

        run_migrations(&pool).await.expect("Failed to run migrations");

        assert_eq!(pending_count(&pool).await.unwrap(), 0);
        assert!(is_up_to_date(&pool).await.unwrap());
    }

    #[test]
    fn test_migration_versions_are_sequential() {
        for (idx, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, idx + 1);
        }
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        let user_id = insert_user(sqlite, "alice").await;
        let exercise_id = insert_exercise(sqlite, "Bench Press").await;
        let workout_id = insert_workout(sqlite, user_id).await;
        insert_entry(sqlite, workout_id, exercise_id).await;

        let unit: String = sqlx::query_scalar("SELECT unit FROM exercises WHERE id = ?")
            .bind(exercise_id)
            .fetch_one(sqlite)
            .await
            .unwrap();
        assert_eq!(unit, "reps");

        let location: String = sqlx::query_scalar("SELECT location FROM workouts WHERE id = ?")
            .bind(workout_id)
            .fetch_one(sqlite)
            .await
            .unwrap();
        assert_eq!(location, "Gym");

        let (sets, weight): (i64, f64) =
            sqlx::query_as("SELECT sets, weight FROM workout_entries WHERE workout_id = ?")
                .bind(workout_id)
                .fetch_one(sqlite)
                .await
                .unwrap();
        assert_eq!(sets, 1);
        assert_eq!(weight, 0.0);
    }

    #[tokio::test]
    async fn test_username_unique() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        insert_user(sqlite, "alice").await;
        let duplicate = sqlx::query("INSERT INTO users (username, password_hash) VALUES ('alice', 'x')")
            .execute(sqlite)
            .await;

        assert!(duplicate.is_err());
        assert_eq!(count(sqlite, "users").await, 1);
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        let user_id = insert_user(sqlite, "alice").await;
        let exercise_id = insert_exercise(sqlite, "Squat").await;
        let workout_id = insert_workout(sqlite, user_id).await;
        insert_entry(sqlite, workout_id, exercise_id).await;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(sqlite)
            .await
            .unwrap();

        assert_eq!(count(sqlite, "workouts").await, 0);
        assert_eq!(count(sqlite, "workout_entries").await, 0);
        assert_eq!(count(sqlite, "exercises").await, 1);
    }

    #[tokio::test]
    async fn test_exercise_delete_cascades_only_its_entries() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        let user_id = insert_user(sqlite, "alice").await;
        let squat = insert_exercise(sqlite, "Squat").await;
        let bench = insert_exercise(sqlite, "Bench Press").await;
        let workout_id = insert_workout(sqlite, user_id).await;
        insert_entry(sqlite, workout_id, squat).await;
        insert_entry(sqlite, workout_id, squat).await;
        insert_entry(sqlite, workout_id, bench).await;

        sqlx::query("DELETE FROM exercises WHERE id = ?")
            .bind(squat)
            .execute(sqlite)
            .await
            .unwrap();

        assert_eq!(count(sqlite, "workout_entries").await, 1);
        assert_eq!(count(sqlite, "workouts").await, 1);
    }

    #[tokio::test]
    async fn test_foreign_key_constraints() {
        let pool = migrated_pool().await;
        let sqlite = pool.sqlite().unwrap();

        let orphan = sqlx::query("INSERT INTO workouts (user_id, performed_at) VALUES (999, '2024-01-01')")
            .execute(sqlite)
            .await;

        assert!(orphan.is_err());
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n  -- comment only\n;\nCREATE INDEX i ON a(id);  ";
        let statements = split_sql_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "CREATE INDEX i ON a(id)"]);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- just a comment"));
        assert!(is_comment_only("  \n  -- a\n  -- b"));
        assert!(!is_comment_only("SELECT 1"));
        assert!(!is_comment_only("-- comment\nSELECT 1"));
    }

    #[test]
    fn test_truncate_sql() {
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
    }
}
