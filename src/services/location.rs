//! Location service; reads and writes go straight to the repository

use tracing::info;

use crate::errors::AppResult;
use crate::models::{CreateLocationRequest, Location};
use crate::repositories::{FetchQuery, LocationRepository, Repository};

pub struct LocationService<R = LocationRepository> {
    repository: R,
}

impl<R> LocationService<R>
where
    R: Repository<Location, CreateRequest = CreateLocationRequest>,
{
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub async fn fetch(&self) -> AppResult<Vec<Location>> {
        Ok(self.repository.fetch(FetchQuery::new()).await?.into_items())
    }

    pub async fn create(&self, request: CreateLocationRequest) -> AppResult<Location> {
        let location = self.repository.create(request).await?;
        info!(location_id = %location.id, name = %location.name, "Location created");
        Ok(location)
    }

    pub async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.repository.exists(id).await?)
    }

    pub async fn name_taken(&self, name: &str) -> AppResult<bool> {
        let existing = self
            .repository
            .fetch(FetchQuery::new().filter("name", name))
            .await?;
        Ok(!existing.is_empty())
    }
}
