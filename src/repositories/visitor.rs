//! Visitor record repository implementation
//!
//! Also serves the summary aggregate, which reads sensors and visitor
//! records together.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

use super::query::TableDef;
use super::traits::{FetchQuery, Listing, Relation, Repository, SummaryRepository};
use crate::errors::RepositoryResult;
use crate::models::{CreateVisitorRequest, SensorProjection, SensorStats, Summary, VisitorRecord};
use crate::utils::IdGenerator;

const VISITORS: TableDef = TableDef {
    table: "visitors",
    alias: "v",
    select: "v.id, v.sensor_id, v.date, v.count, v.created_at, v.updated_at, \
             s.location_id AS sensor_location_id",
    from: "visitors v LEFT JOIN sensors s ON s.id = v.sensor_id",
    filterable: &["id", "sensor_id", "date"],
};

// Every sensor contributes to the status counts exactly once; the date
// window only restricts which visitor rows are summed.
const SUMMARY_SQL: &str = r#"
    SELECT
        COALESCE(SUM(v.count), 0) AS total_visitors,
        COUNT(DISTINCT CASE WHEN s.status = 'active' THEN s.id END) AS active_sensors,
        COUNT(DISTINCT CASE WHEN s.status = 'inactive' THEN s.id END) AS inactive_sensors
    FROM sensors s
    LEFT JOIN visitors v ON v.sensor_id = s.id AND v.date >= ?
"#;

#[derive(Debug, FromRow)]
struct VisitorRow {
    id: String,
    sensor_id: String,
    date: NaiveDate,
    count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sensor_location_id: Option<String>,
}

impl VisitorRow {
    fn into_record(self, with_sensor: bool) -> VisitorRecord {
        let sensor = if with_sensor {
            self.sensor_location_id.map(|location_id| SensorProjection {
                id: self.sensor_id.clone(),
                location_id,
            })
        } else {
            None
        };

        VisitorRecord {
            id: self.id,
            sensor_id: self.sensor_id,
            date: self.date,
            count: self.count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sensor,
        }
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    total_visitors: i64,
    active_sensors: i64,
    inactive_sensors: i64,
}

#[derive(Clone)]
pub struct VisitorRepository {
    pool: SqlitePool,
    ids: Arc<dyn IdGenerator>,
}

impl VisitorRepository {
    pub fn new(pool: SqlitePool, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, ids }
    }
}

#[async_trait]
impl Repository<VisitorRecord> for VisitorRepository {
    type CreateRequest = CreateVisitorRequest;

    async fn fetch(&self, query: FetchQuery) -> RepositoryResult<Listing<VisitorRecord>> {
        let with_sensor = query.includes_relation(Relation::Sensor);
        Ok(VISITORS
            .fetch::<VisitorRow>(&self.pool, &query)
            .await?
            .map(|row| row.into_record(with_sensor)))
    }

    async fn find_by_id(
        &self,
        id: &str,
        includes: &[Relation],
    ) -> RepositoryResult<Option<VisitorRecord>> {
        let with_sensor = includes.contains(&Relation::Sensor);
        Ok(VISITORS
            .find_by_id::<VisitorRow>(&self.pool, id)
            .await?
            .map(|row| row.into_record(with_sensor)))
    }

    async fn create(&self, request: CreateVisitorRequest) -> RepositoryResult<VisitorRecord> {
        let id = self.ids.generate();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO visitors (id, sensor_id, date, count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&request.sensor_id)
        .bind(request.date)
        .bind(request.count)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(VisitorRecord {
            id,
            sensor_id: request.sensor_id,
            date: request.date,
            count: request.count,
            created_at: now,
            updated_at: now,
            sensor: None,
        })
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        VISITORS.delete(&self.pool, id).await
    }
}

#[async_trait]
impl SummaryRepository for VisitorRepository {
    async fn summary_since(&self, from: NaiveDate) -> RepositoryResult<Summary> {
        let row = sqlx::query_as::<_, SummaryRow>(SUMMARY_SQL)
            .bind(from)
            .fetch_one(&self.pool)
            .await?;

        Ok(Summary {
            total_visitors_last_7_days: row.total_visitors,
            sensor_stats: SensorStats {
                active: row.active_sensors,
                inactive: row.inactive_sensors,
            },
        })
    }
}
