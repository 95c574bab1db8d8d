//! Repository pattern implementation for data access
//!
//! This module provides a clean abstraction layer over the database,
//! implementing the Repository pattern to separate the caching services
//! from SQL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use visitor_tracker::repositories::{FetchQuery, Repository, SensorRepository};
//!
//! let active = sensors.fetch(FetchQuery::new().filter("status", "active")).await?;
//! ```

mod query;
pub mod location;
pub mod sensor;
pub mod traits;
pub mod visitor;

// Re-export main traits and types
pub use location::LocationRepository;
pub use sensor::SensorRepository;
pub use traits::*;
pub use visitor::VisitorRepository;
