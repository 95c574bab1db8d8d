//! Error type definitions for the visitor tracker
//!
//! Errors are layered: repositories raise [`RepositoryError`], the cache
//! store raises [`CacheError`], and services surface both through
//! [`AppError`].

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database connection failures
    #[error("Database connection failed: {message}")]
    ConnectionFailed { message: String },

    /// SQL query execution failures
    #[error("Query failed: {query} - {message}")]
    QueryFailed { query: String, message: String },

    /// Constraint violations (unique, foreign key, check)
    #[error("Constraint violation: {constraint} - {message}")]
    ConstraintViolation { constraint: String, message: String },

    /// Filter on a column the repository does not expose
    #[error("Invalid filter: {field} is not filterable on {table}")]
    InvalidFilter { table: String, field: String },

    /// Migration failures
    #[error("Migration failed: {version} - {message}")]
    MigrationFailed { version: String, message: String },
}

/// Cache store specific errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value could not be converted to or from its cached form
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Increment on a key holding a non-integer value
    #[error("Cache value at {key} is not an integer")]
    NotAnInteger { key: String },
}

impl AppError {
    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// True when the underlying failure is a unique or foreign-key violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Repository(RepositoryError::ConstraintViolation { .. })
        )
    }
}

impl RepositoryError {
    /// Create a query failed error
    pub fn query_failed<Q: Into<String>, M: Into<String>>(query: Q, message: M) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint_violation<C: Into<String>, M: Into<String>>(
        constraint: C,
        message: M,
    ) -> Self {
        Self::ConstraintViolation {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter<T: Into<String>, F: Into<String>>(table: T, field: F) -> Self {
        Self::InvalidFilter {
            table: table.into(),
            field: field.into(),
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
            {
                let constraint = if db_err.is_unique_violation() {
                    "unique"
                } else {
                    "foreign_key"
                };
                Self::constraint_violation(constraint, db_err.message())
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::constraint_violation("check", db_err.message())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::ConnectionFailed {
                    message: err.to_string(),
                }
            }
            _ => Self::query_failed("sql", err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_detection() {
        let err: AppError = RepositoryError::constraint_violation("unique", "dup").into();
        assert!(err.is_constraint_violation());

        let err: AppError = RepositoryError::query_failed("select", "boom").into();
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_error_messages() {
        let err = RepositoryError::invalid_filter("sensors", "colour");
        assert_eq!(
            err.to_string(),
            "Invalid filter: colour is not filterable on sensors"
        );

        let err = CacheError::NotAnInteger {
            key: "visitors:access_count:date:all".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cache value at visitors:access_count:date:all is not an integer"
        );
    }

    #[test]
    fn test_service_errors_wrap_their_source() {
        let err: AppError = CacheError::NotAnInteger {
            key: "hits".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Cache error: Cache value at hits is not an integer");

        let err = AppError::not_found("visitor", "v-1");
        assert_eq!(err.to_string(), "Not found: visitor with id v-1");
        assert!(!err.is_constraint_violation());
    }
}
