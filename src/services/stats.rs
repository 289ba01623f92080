//! Statistics service
//!
//! Aggregates over one user's history. Read-only.

use crate::db::repositories::StatsRepository;
use crate::models::Stats;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;

/// Trailing window for the per-day chart
pub const CHART_WINDOW_DAYS: i64 = 28;

/// Number of exercises in the frequency ranking
pub const TOP_EXERCISES_LIMIT: i64 = 5;

pub struct StatsService {
    repo: Arc<dyn StatsRepository>,
}

impl StatsService {
    pub fn new(repo: Arc<dyn StatsRepository>) -> Self {
        Self { repo }
    }

    /// Statistics for the caller as of today (UTC)
    pub async fn for_user(&self, user_id: i64) -> Result<Stats> {
        self.for_user_on(user_id, Utc::now().date_naive()).await
    }

    /// Statistics with the chart window ending on `today`
    pub async fn for_user_on(&self, user_id: i64, today: NaiveDate) -> Result<Stats> {
        let since = today - Duration::days(CHART_WINDOW_DAYS);

        let total_workouts = self
            .repo
            .count_workouts(user_id)
            .await
            .context("Failed to count workouts")?;
        let total_entries = self
            .repo
            .count_entries(user_id)
            .await
            .context("Failed to count entries")?;
        let workouts_per_day = self
            .repo
            .workouts_per_day(user_id, since)
            .await
            .context("Failed to build workout chart")?;
        let top_exercises = self
            .repo
            .top_exercises(user_id, TOP_EXERCISES_LIMIT)
            .await
            .context("Failed to rank exercises")?;

        Ok(Stats {
            total_workouts,
            total_entries,
            workouts_per_day,
            top_exercises,
        })
    }
}
