//! Location repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::query::TableDef;
use super::traits::{FetchQuery, Listing, Relation, Repository};
use crate::errors::RepositoryResult;
use crate::models::{CreateLocationRequest, Location};
use crate::utils::IdGenerator;

const LOCATIONS: TableDef = TableDef {
    table: "locations",
    alias: "l",
    select: "l.id, l.name, l.created_at, l.updated_at",
    from: "locations l",
    filterable: &["id", "name"],
};

#[derive(Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
    ids: Arc<dyn IdGenerator>,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, ids }
    }
}

#[async_trait]
impl Repository<Location> for LocationRepository {
    type CreateRequest = CreateLocationRequest;

    async fn fetch(&self, query: FetchQuery) -> RepositoryResult<Listing<Location>> {
        LOCATIONS.fetch(&self.pool, &query).await
    }

    async fn find_by_id(&self, id: &str, _includes: &[Relation]) -> RepositoryResult<Option<Location>> {
        LOCATIONS.find_by_id(&self.pool, id).await
    }

    async fn create(&self, request: CreateLocationRequest) -> RepositoryResult<Location> {
        let id = self.ids.generate();
        let now = Utc::now();

        sqlx::query("INSERT INTO locations (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&request.name)
            .bind(now.to_rfc3339())
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(Location {
            id,
            name: request.name,
            created_at: now,
            updated_at: now,
        })
    }

    async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        LOCATIONS.delete(&self.pool, id).await
    }
}
