//! HTTP request handlers organized by resource
//!
//! Handlers validate input, call one service and wrap the result in the
//! response envelope. Caching decisions live in the services.

pub mod health;
pub mod locations;
pub mod sensors;
pub mod summary;
pub mod visitors;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use std::collections::HashMap;

use super::responses::ApiError;

pub type QueryParams = Result<Query<HashMap<String, String>>, QueryRejection>;

/// Query string parameters with empty values dropped, so `?date=` behaves
/// like an absent filter
pub(crate) fn query_params(params: QueryParams) -> Result<HashMap<String, String>, ApiError> {
    let Query(params) = params?;
    Ok(params.into_iter().filter(|(_, v)| !v.is_empty()).collect())
}
