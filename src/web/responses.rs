//! HTTP response types and utilities
//!
//! Every endpoint answers with the same envelope:
//! `{success: true, message, data}` on success and
//! `{success: false, message, errors}` on failure.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use super::validation::ValidationErrors;
use crate::errors::AppError;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Success";
pub const VALIDATION_FAILED_MESSAGE: &str = "The given data was invalid.";

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    pub message: String,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response
    pub fn success<M: Into<String>>(data: T, message: M) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create an error response
    pub fn error<M: Into<String>>(message: M, errors: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: Some(errors),
        }
    }
}

/// Success response helpers
pub fn ok<T: Serialize, M: Into<String>>(data: T, message: M) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data, message))).into_response()
}

pub fn created<T: Serialize, M: Into<String>>(data: T, message: M) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data, message))).into_response()
}

/// Everything a handler can fail with
#[derive(Debug)]
pub enum ApiError {
    /// Request input broke one or more rules (422)
    Validation(ValidationErrors),
    /// Body or query string could not be parsed at all (400)
    BadRequest(String),
    /// A service call failed; `message` names the action (500)
    Failed {
        message: &'static str,
        error: AppError,
    },
}

impl ApiError {
    /// Map a service error onto a failure envelope for `message`
    pub fn failed(message: &'static str) -> impl FnOnce(AppError) -> ApiError {
        move |error| ApiError::Failed { message, error }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => {
                warn!(fields = ?errors.fields(), "request validation failed");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ApiResponse::<()>::error(VALIDATION_FAILED_MESSAGE, errors.to_json()),
                )
            }
            ApiError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::error("Malformed request", Value::String(reason)),
            ),
            ApiError::Failed { message, error } => {
                error!("{}: {}", message, error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::error(message, Value::String(error.to_string())),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type returned by every handler
pub type ApiResult = Result<Response, ApiError>;
