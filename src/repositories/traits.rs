//! Repository trait definitions
//!
//! This module defines the core traits that all repositories implement,
//! together with the query and listing types they share.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::RepositoryResult;
use crate::models::Summary;

/// Core repository trait providing fetch/create/delete operations
///
/// # Type Parameters
///
/// * `T` - The entity type (e.g., Sensor, VisitorRecord)
///
/// # Examples
///
/// ```rust,ignore
/// use visitor_tracker::repositories::{FetchQuery, Repository};
///
/// async fn active<R: Repository<Sensor>>(repo: &R) -> RepositoryResult<Listing<Sensor>> {
///     repo.fetch(FetchQuery::new().filter("status", "active")).await
/// }
/// ```
#[async_trait]
pub trait Repository<T: Send + 'static>: Send + Sync {
    /// Request type for creating new entities
    type CreateRequest: Send + 'static;

    /// Fetch entities matching equality filters, optionally paginated
    ///
    /// # Returns
    ///
    /// * `Ok(Listing::All)` - No pagination requested
    /// * `Ok(Listing::Page)` - One page plus paging metadata
    /// * `Err(RepositoryError::InvalidFilter)` - Filter on a non-filterable column
    async fn fetch(&self, query: FetchQuery) -> RepositoryResult<Listing<T>>;

    /// Find an entity by its ID, loading the requested relations
    async fn find_by_id(&self, id: &str, includes: &[Relation]) -> RepositoryResult<Option<T>>;

    /// Create a new entity with a generated ID and timestamps
    async fn create(&self, request: Self::CreateRequest) -> RepositoryResult<T>;

    /// Delete an entity by ID
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Entity deleted (dependent rows cascade)
    /// * `Ok(false)` - No entity with that ID
    async fn delete(&self, id: &str) -> RepositoryResult<bool>;

    /// Check if an entity exists by ID
    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.find_by_id(id, &[]).await?.is_some())
    }
}

/// Aggregate reads backing the summary endpoint
#[async_trait]
pub trait SummaryRepository: Send + Sync {
    /// Visitor total for records dated on or after `from`, plus sensor
    /// counts by status over all sensors.
    async fn summary_since(&self, from: NaiveDate) -> RepositoryResult<Summary>;
}

/// Related data a fetch can project onto its results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `{id, location_id}` of the sensor behind a visitor record
    Sensor,
}

/// Page size and 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub per_page: u32,
    pub page: u32,
}

impl Pagination {
    pub fn new(per_page: u32, page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            page: page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }
}

/// Filters, relations and paging for [`Repository::fetch`]
#[derive(Debug, Clone, Default)]
pub struct FetchQuery {
    /// Column equality filters, applied in insertion order
    pub filters: Vec<(String, String)>,
    /// Relations to project onto each result
    pub includes: Vec<Relation>,
    /// Page to return; `None` returns every match
    pub pagination: Option<Pagination>,
}

impl FetchQuery {
    /// Create new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter
    pub fn filter<K: Into<String>, V: ToString>(mut self, field: K, value: V) -> Self {
        self.filters.push((field.into(), value.to_string()));
        self
    }

    /// Add an equality filter when a value is present
    pub fn filter_opt<K: Into<String>, V: ToString>(self, field: K, value: Option<V>) -> Self {
        match value {
            Some(value) => self.filter(field, value),
            None => self,
        }
    }

    /// Project a relation onto each result
    pub fn include(mut self, relation: Relation) -> Self {
        if !self.includes.contains(&relation) {
            self.includes.push(relation);
        }
        self
    }

    /// Return one page instead of every match
    pub fn paginate(mut self, per_page: u32, page: u32) -> Self {
        self.pagination = Some(Pagination::new(per_page, page));
        self
    }

    pub fn includes_relation(&self, relation: Relation) -> bool {
        self.includes.contains(&relation)
    }
}

/// Paging metadata, 1-based; `from`/`to` are absent on an empty page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total: u64) -> Self {
        let per_page = pagination.per_page as u64;
        let last_page = total.div_ceil(per_page).max(1) as u32;
        let offset = pagination.offset();
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + data.len() as u64))
        };

        Self {
            meta: PageMeta {
                current_page: pagination.page,
                per_page: pagination.per_page,
                total,
                last_page,
                from,
                to,
            },
            data,
        }
    }
}

/// Result of a fetch: every match, or one page of matches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Page(Page<T>),
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Listing::All(items) => items,
            Listing::Page(page) => &page.data,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::All(items) => items,
            Listing::Page(page) => page.data,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Convert every item, keeping paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Listing<U> {
        match self {
            Listing::All(items) => Listing::All(items.into_iter().map(f).collect()),
            Listing::Page(page) => Listing::Page(Page {
                data: page.data.into_iter().map(f).collect(),
                meta: page.meta,
            }),
        }
    }

    /// Fallible [`Listing::map`]; the first error aborts the conversion
    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, f: F) -> Result<Listing<U>, E> {
        Ok(match self {
            Listing::All(items) => Listing::All(items.into_iter().map(f).collect::<Result<_, _>>()?),
            Listing::Page(page) => Listing::Page(Page {
                data: page.data.into_iter().map(f).collect::<Result<_, _>>()?,
                meta: page.meta,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_bounds() {
        let page = Page::new(vec![1, 2], Pagination::new(2, 2), 5);
        assert_eq!(page.meta.last_page, 3);
        assert_eq!(page.meta.from, Some(3));
        assert_eq!(page.meta.to, Some(4));

        let empty: Page<i32> = Page::new(vec![], Pagination::new(10, 4), 5);
        assert_eq!(empty.meta.last_page, 1);
        assert_eq!(empty.meta.from, None);
        assert_eq!(empty.meta.to, None);
    }

    #[test]
    fn test_pagination_clamps_to_first_page() {
        let pagination = Pagination::new(0, 0);
        assert_eq!(pagination, Pagination { per_page: 1, page: 1 });
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn test_listing_serializes_untagged() {
        let all: Listing<i32> = Listing::All(vec![1, 2]);
        assert_eq!(serde_json::to_value(&all).unwrap(), serde_json::json!([1, 2]));

        let page = Listing::Page(Page::new(vec![1], Pagination::new(1, 1), 2));
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["data"], serde_json::json!([1]));
        assert_eq!(value["meta"]["last_page"], 2);

        let back: Listing<i32> = serde_json::from_value(value).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn test_fetch_query_builder() {
        let query = FetchQuery::new()
            .filter("status", "active")
            .filter_opt::<_, String>("date", None)
            .include(Relation::Sensor)
            .include(Relation::Sensor)
            .paginate(5, 2);
        assert_eq!(query.filters, vec![("status".to_string(), "active".to_string())]);
        assert_eq!(query.includes, vec![Relation::Sensor]);
        assert_eq!(query.pagination.map(|p| p.offset()), Some(5));
    }
}
