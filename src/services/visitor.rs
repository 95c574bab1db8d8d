//! Visitor service with frequency-gated caching
//!
//! Every listing request bumps a per-query access counter. Until the
//! counter reaches `counter_threshold` the listing is read straight from the
//! repository; from then on it is served through the `visitors` cache tag.
//! The counter window is anchored to the first access and is not extended
//! by later hits.

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{Cache, TAG_SUMMARY, TAG_VISITORS};
use crate::config::CacheConfig;
use crate::errors::{AppError, AppResult};
use crate::metrics::ErrorReporter;
use crate::models::{CreateVisitorRequest, VisitorRecord};
use crate::repositories::{FetchQuery, Relation, Repository, VisitorRepository};

/// How a listing request is served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
    Direct,
    Cached,
}

/// Caching state of one visitor query key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// No live access counter
    Cold,
    /// Counted but still below the threshold
    Counting(i64),
    /// At or above the threshold; reads go through the cache
    Cached(i64),
}

/// Gate between direct and cached reads
pub fn decide(count: i64, threshold: i64) -> FetchPath {
    if count >= threshold {
        FetchPath::Cached
    } else {
        FetchPath::Direct
    }
}

/// `date:<YYYY-MM-DD>` or `date:all`
pub fn query_key(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("date:{}", date.format("%Y-%m-%d")),
        None => "date:all".to_string(),
    }
}

pub fn counter_key(query_key: &str) -> String {
    format!("visitors:access_count:{}", query_key)
}

pub struct VisitorService<R = VisitorRepository> {
    repository: R,
    cache: Cache,
    config: CacheConfig,
    reporter: Arc<dyn ErrorReporter>,
}

impl<R> VisitorService<R>
where
    R: Repository<VisitorRecord, CreateRequest = CreateVisitorRequest>,
{
    pub fn new(
        repository: R,
        cache: Cache,
        config: CacheConfig,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            repository,
            cache,
            config,
            reporter,
        }
    }

    /// Visitor records, optionally for one day, each with its sensor projection
    pub async fn fetch(&self, date: Option<NaiveDate>) -> AppResult<Vec<VisitorRecord>> {
        let key = query_key(date);
        let counter = counter_key(&key);

        let count = self.cache.increment(&counter).await?;
        if count == 1 {
            self.cache
                .set_with_ttl(&counter, Value::from(1), self.config.counter_ttl())
                .await?;
        }

        match decide(count, self.config.counter_threshold) {
            FetchPath::Cached => {
                self.cache
                    .get_or_compute(&[TAG_VISITORS], &key, self.config.ttl(), || {
                        self.load(date)
                    })
                    .await
            }
            FetchPath::Direct => {
                debug!(key = %key, count, "visitor query below cache threshold");
                self.load(date).await
            }
        }
    }

    async fn load(&self, date: Option<NaiveDate>) -> AppResult<Vec<VisitorRecord>> {
        let query = FetchQuery::new()
            .filter_opt("date", date)
            .include(Relation::Sensor);
        Ok(self.repository.fetch(query).await?.into_items())
    }

    /// Caching state of the listing for `date`, without counting an access
    pub async fn access_state(&self, date: Option<NaiveDate>) -> AppResult<AccessState> {
        let counter = counter_key(&query_key(date));
        Ok(match self.cache.counter(&counter).await? {
            None => AccessState::Cold,
            Some(n) => match decide(n, self.config.counter_threshold) {
                FetchPath::Direct => AccessState::Counting(n),
                FetchPath::Cached => AccessState::Cached(n),
            },
        })
    }

    /// Persist a visitor record and invalidate the listings it affects.
    ///
    /// Failures are reported before being returned.
    pub async fn create(&self, request: CreateVisitorRequest) -> AppResult<VisitorRecord> {
        match self.try_create(request).await {
            Ok(record) => Ok(record),
            Err(e) => {
                self.reporter.report("create_visitor", &e);
                Err(e)
            }
        }
    }

    async fn try_create(&self, request: CreateVisitorRequest) -> AppResult<VisitorRecord> {
        let date = request.date;
        let created = self.repository.create(request).await?;

        for key in [query_key(Some(date)), query_key(None)] {
            if self.cache.has(TAG_VISITORS, &key).await? {
                self.cache.invalidate_key(TAG_VISITORS, &key).await?;
            }
        }
        self.cache.invalidate_tags(&[TAG_SUMMARY]).await?;

        let record = self
            .repository
            .find_by_id(&created.id, &[Relation::Sensor])
            .await?
            .ok_or_else(|| AppError::not_found("visitor", created.id.as_str()))?;

        info!(
            visitor_id = %record.id,
            sensor_id = %record.sensor_id,
            date = %record.date,
            count = record.count,
            "Visitor record created"
        );
        Ok(record)
    }

    /// Whether `sensor_id` already has a record for `date`
    pub async fn is_recorded(&self, sensor_id: &str, date: NaiveDate) -> AppResult<bool> {
        let existing = self
            .repository
            .fetch(
                FetchQuery::new()
                    .filter("sensor_id", sensor_id)
                    .filter("date", date),
            )
            .await?;
        Ok(!existing.is_empty())
    }
}
