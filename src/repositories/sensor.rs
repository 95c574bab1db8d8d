//! Sensor repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

use super::query::TableDef;
use super::traits::{FetchQuery, Listing, Relation, Repository};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{CreateSensorRequest, Sensor};
use crate::utils::IdGenerator;

const SENSORS: TableDef = TableDef {
    table: "sensors",
    alias: "s",
    select: "s.id, s.name, s.status, s.location_id, s.created_at, s.updated_at",
    from: "sensors s",
    filterable: &["id", "name", "status", "location_id"],
};

#[derive(Debug, FromRow)]
struct SensorRow {
    id: String,
    name: String,
    status: String,
    location_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SensorRow> for Sensor {
    type Error = RepositoryError;

    fn try_from(row: SensorRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e: String| RepositoryError::query_failed("decode_sensor", e))?;

        Ok(Sensor {
            id: row.id,
            name: row.name,
            status,
            location_id: row.location_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct SensorRepository {
    pool: SqlitePool,
    ids: Arc<dyn IdGenerator>,
}

impl SensorRepository {
    pub fn new(pool: SqlitePool, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, ids }
    }
}

#[async_trait]
impl Repository<Sensor> for SensorRepository {
    type CreateRequest = CreateSensorRequest;

    async fn fetch(&self, query: FetchQuery) -> RepositoryResult<Listing<Sensor>> {
        SENSORS
            .fetch::<SensorRow>(&self.pool, &query)
            .await?
            .try_map(Sensor::try_from)
    }

    async fn find_by_id(&self, id: &str, _includes: &[Relation]) -> RepositoryResult<Option<Sensor>> {
        SENSORS
            .find_by_id::<SensorRow>(&self.pool, id)
            .await?
            .map(Sensor::try_from)
            .transpose()
    }

    async fn create(&self, request: CreateSensorRequest) -> RepositoryResult<Sensor> {
        let id = self.ids.generate();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sensors (id, name, status, location_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&request.name)
        .bind(request.status.as_str())
        .bind(&request.location_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Sensor {
            id,
            name: request.name,
            status: request.status,
            location_id: request.location_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        SENSORS.delete(&self.pool, id).await
    }
}
