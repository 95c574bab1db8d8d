//! Summary service
//!
//! One cached aggregate, refreshed whenever sensors or visitor records
//! change (both creates flush the `summary` tag).

use chrono::{Days, NaiveDate, Utc};

use crate::cache::{Cache, TAG_SUMMARY};
use crate::config::CacheConfig;
use crate::errors::{AppError, AppResult};
use crate::models::Summary;
use crate::repositories::{SummaryRepository, VisitorRepository};

pub const SUMMARY_KEY: &str = "summary:last_7_days";
pub const SUMMARY_WINDOW_DAYS: u64 = 7;

/// First day counted by a summary computed on `today` (inclusive).
///
/// The window is `SUMMARY_WINDOW_DAYS` calendar days with today as the last.
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Days::new(SUMMARY_WINDOW_DAYS - 1)
}

pub struct SummaryService<R = VisitorRepository> {
    repository: R,
    cache: Cache,
    config: CacheConfig,
}

impl<R: SummaryRepository> SummaryService<R> {
    pub fn new(repository: R, cache: Cache, config: CacheConfig) -> Self {
        Self {
            repository,
            cache,
            config,
        }
    }

    pub async fn get(&self) -> AppResult<Summary> {
        self.get_as_of(Utc::now().date_naive()).await
    }

    /// Summary for a window ending on `today`; cached under one fixed key
    pub async fn get_as_of(&self, today: NaiveDate) -> AppResult<Summary> {
        let from = window_start(today);
        self.cache
            .get_or_compute(&[TAG_SUMMARY], SUMMARY_KEY, self.config.ttl(), || async move {
                self.repository
                    .summary_since(from)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }
}
