//! Centralized error handling for the visitor tracker
//!
//! # Error Categories
//!
//! - **Repository Errors**: SQLite queries, constraints, migrations
//! - **Cache Errors**: serialization and counter failures in the cache store
//!
//! # Usage
//!
//! ```rust
//! use visitor_tracker::errors::{AppError, AppResult};
//!
//! async fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for Cache Results
pub type CacheResult<T> = Result<T, CacheError>;
