//! Location endpoints

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::models::{location::LOCATION_NAME_MAX_LEN, CreateLocationRequest};
use crate::web::responses::{created, ok, ApiError, ApiResult, DEFAULT_SUCCESS_MESSAGE};
use crate::web::validation::{self, max_chars, required, string, ValidationError, ValidationErrors};
use crate::web::AppState;

const FETCH_FAILED: &str = "Failed to fetch locations";
const CREATE_FAILED: &str = "Failed to create location";

/// List all locations
pub async fn index(State(state): State<AppState>) -> ApiResult {
    let locations = state
        .locations
        .fetch()
        .await
        .map_err(ApiError::failed(FETCH_FAILED))?;

    let message = if locations.is_empty() {
        "No locations found"
    } else {
        DEFAULT_SUCCESS_MESSAGE
    };
    Ok(ok(locations, message))
}

/// Create a location
pub async fn store(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let request = validate(&state, &body).await?;

    let location = state
        .locations
        .create(request)
        .await
        .map_err(ApiError::failed(CREATE_FAILED))?;
    Ok(created(location, "Location created"))
}

async fn validate(state: &AppState, body: &Value) -> Result<CreateLocationRequest, ApiError> {
    let input = validation::object(body);
    let mut errors = ValidationErrors::new();

    let name = errors.check(
        "name",
        required(&input, "name")
            .and_then(|v| string(v, "name"))
            .and_then(|s| max_chars(s, LOCATION_NAME_MAX_LEN, "name")),
    );

    if let Some(name) = name {
        let taken = state
            .locations
            .name_taken(name)
            .await
            .map_err(ApiError::failed(CREATE_FAILED))?;
        if taken {
            errors.add(
                "name",
                ValidationError::Taken {
                    field: "name".to_string(),
                },
            );
        }
    }

    match name {
        Some(name) if errors.is_empty() => Ok(CreateLocationRequest {
            name: name.to_string(),
        }),
        _ => Err(errors.into()),
    }
}
