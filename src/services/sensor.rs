//! Sensor service
//!
//! Plain read-through caching: every distinct filter/page combination is
//! cached under the `sensors` tag, and creating a sensor flushes both the
//! sensor listings and the summary.

use tracing::{debug, info};

use crate::cache::{Cache, TAG_SENSORS, TAG_SUMMARY};
use crate::config::CacheConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{CreateSensorRequest, Sensor, SensorStatus};
use crate::repositories::{FetchQuery, Listing, Repository, SensorRepository};

/// Filters and paging accepted by the sensor listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorQuery {
    pub status: Option<SensorStatus>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl SensorQuery {
    /// `status:<status|all>:limit:<limit|all>`, with `:page:<page>` appended
    /// when a limit is set
    pub fn cache_key(&self) -> String {
        let status = self.status.map(|s| s.to_string()).unwrap_or_else(|| "all".to_string());
        match self.limit {
            Some(limit) => format!(
                "status:{}:limit:{}:page:{}",
                status,
                limit,
                self.page.unwrap_or(1)
            ),
            None => format!("status:{}:limit:all", status),
        }
    }

    fn to_fetch_query(self) -> FetchQuery {
        let query = FetchQuery::new().filter_opt("status", self.status);
        match self.limit {
            Some(limit) => query.paginate(limit, self.page.unwrap_or(1)),
            None => query,
        }
    }
}

pub struct SensorService<R = SensorRepository> {
    repository: R,
    cache: Cache,
    config: CacheConfig,
}

impl<R> SensorService<R>
where
    R: Repository<Sensor, CreateRequest = CreateSensorRequest>,
{
    pub fn new(repository: R, cache: Cache, config: CacheConfig) -> Self {
        Self {
            repository,
            cache,
            config,
        }
    }

    /// Sensor listing for `query`, served from cache while fresh
    pub async fn fetch(&self, query: SensorQuery) -> AppResult<Listing<Sensor>> {
        let key = query.cache_key();
        self.cache
            .get_or_compute(&[TAG_SENSORS], &key, self.config.ttl(), || async {
                debug!(key = %key, "loading sensors from repository");
                self.repository
                    .fetch(query.to_fetch_query())
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    /// Persist a sensor, then flush sensor listings and the summary
    pub async fn create(&self, request: CreateSensorRequest) -> AppResult<Sensor> {
        let sensor = self.repository.create(request).await?;
        let flushed = self.cache.invalidate_tags(&[TAG_SENSORS, TAG_SUMMARY]).await?;
        info!(
            sensor_id = %sensor.id,
            location_id = %sensor.location_id,
            flushed,
            "Sensor created"
        );
        Ok(sensor)
    }

    pub async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.repository.exists(id).await?)
    }

    /// Whether `name` is already used by a sensor at `location_id`
    pub async fn name_taken(&self, location_id: &str, name: &str) -> AppResult<bool> {
        let existing = self
            .repository
            .fetch(
                FetchQuery::new()
                    .filter("location_id", location_id)
                    .filter("name", name),
            )
            .await?;
        Ok(!existing.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    #[test]
    fn test_cache_keys() {
        assert_eq!(SensorQuery::default().cache_key(), "status:all:limit:all");
        assert_eq!(
            SensorQuery {
                status: Some(SensorStatus::Active),
                limit: Some(10),
                page: None,
            }
            .cache_key(),
            "status:active:limit:10:page:1"
        );
        assert_eq!(
            SensorQuery {
                status: None,
                limit: Some(5),
                page: Some(3),
            }
            .cache_key(),
            "status:all:limit:5:page:3"
        );
        // Page is ignored without a limit
        assert_eq!(
            SensorQuery {
                status: Some(SensorStatus::Inactive),
                limit: None,
                page: Some(2),
            }
            .cache_key(),
            "status:inactive:limit:all"
        );
    }

    #[tokio::test]
    async fn test_repeat_fetch_within_ttl_hits_repository_once() {
        let fixture = Fixture::new().await;
        let service = fixture.sensor_service();
        let location = fixture.seed_location("Lobby").await;
        fixture.seed_sensor(&location, "door", SensorStatus::Active).await;

        let first = service.fetch(SensorQuery::default()).await.unwrap();
        let second = service.fetch(SensorQuery::default()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(fixture.sensor_fetches(), 1);
    }

    #[tokio::test]
    async fn test_distinct_queries_are_cached_separately() {
        let fixture = Fixture::new().await;
        let service = fixture.sensor_service();
        let location = fixture.seed_location("Lobby").await;
        fixture.seed_sensor(&location, "door", SensorStatus::Active).await;
        fixture.seed_sensor(&location, "window", SensorStatus::Inactive).await;

        let active = service
            .fetch(SensorQuery {
                status: Some(SensorStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        let paged = service
            .fetch(SensorQuery {
                limit: Some(1),
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active.items()[0].name, "door");
        match paged {
            Listing::Page(page) => {
                assert_eq!(page.data[0].name, "window");
                assert_eq!(page.meta.total, 2);
                assert_eq!(page.meta.last_page, 2);
            }
            Listing::All(_) => panic!("expected a page"),
        }
        assert_eq!(fixture.sensor_fetches(), 2);
    }

    #[tokio::test]
    async fn test_create_flushes_sensors_and_summary() {
        let fixture = Fixture::new().await;
        let service = fixture.sensor_service();
        let location = fixture.seed_location("Lobby").await;

        assert!(service.fetch(SensorQuery::default()).await.unwrap().is_empty());
        fixture.prime_summary().await;

        let created = service
            .create(CreateSensorRequest {
                name: "door".to_string(),
                status: "ACTIVE".parse().unwrap(),
                location_id: location.id.clone(),
            })
            .await
            .unwrap();

        assert_eq!(created.status, SensorStatus::Active);
        assert_eq!(created.location_id, location.id);
        assert!(!fixture.cache.has(TAG_SENSORS, "status:all:limit:all").await.unwrap());
        assert!(!fixture.cache.has(TAG_SUMMARY, "summary:last_7_days").await.unwrap());

        let listing = service.fetch(SensorQuery::default()).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(fixture.sensor_fetches(), 2);
    }

    #[tokio::test]
    async fn test_name_taken_is_scoped_to_location() {
        let fixture = Fixture::new().await;
        let service = fixture.sensor_service();
        let lobby = fixture.seed_location("Lobby").await;
        let garage = fixture.seed_location("Garage").await;
        let sensor = fixture.seed_sensor(&lobby, "door", SensorStatus::Active).await;

        assert!(service.name_taken(&lobby.id, "door").await.unwrap());
        assert!(!service.name_taken(&garage.id, "door").await.unwrap());
        assert!(service.exists(&sensor.id).await.unwrap());
        assert!(!service.exists("missing").await.unwrap());
    }
}
