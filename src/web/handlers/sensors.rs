//! Sensor endpoints

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use std::collections::HashMap;

use super::{query_params, QueryParams};
use crate::models::{sensor::SENSOR_NAME_MAX_LEN, CreateSensorRequest, Sensor, SensorStatus};
use crate::services::SensorQuery;
use crate::web::responses::{created, ok, ApiError, ApiResult, DEFAULT_SUCCESS_MESSAGE};
use crate::web::validation::{
    self, integer_str, max_chars, min, one_of, required, string, uuid, RuleResult,
    ValidationError, ValidationErrors,
};
use crate::web::AppState;

const FETCH_FAILED: &str = "Failed to fetch sensors";
const CREATE_FAILED: &str = "Failed to create sensor";

/// List sensors, optionally filtered by status and paginated by `limit`
pub async fn index(State(state): State<AppState>, params: QueryParams) -> ApiResult {
    let params = query_params(params)?;
    let query = parse_query(&params)?;

    let sensors = state
        .sensors
        .fetch(query)
        .await
        .map_err(ApiError::failed(FETCH_FAILED))?;

    if sensors.is_empty() {
        return Ok(ok(Vec::<Sensor>::new(), DEFAULT_SUCCESS_MESSAGE));
    }
    Ok(ok(sensors, DEFAULT_SUCCESS_MESSAGE))
}

/// Create a sensor
pub async fn store(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let request = validate(&state, &body).await?;

    let sensor = state
        .sensors
        .create(request)
        .await
        .map_err(ApiError::failed(CREATE_FAILED))?;
    Ok(created(sensor, "Sensor created"))
}

/// Listing filters accept only the lowercase status names
fn exact_status(value: &str) -> RuleResult<SensorStatus> {
    let status = match value {
        "active" => Ok(SensorStatus::Active),
        "inactive" => Ok(SensorStatus::Inactive),
        _ => Err(()),
    };
    one_of(status, "status")
}

fn positive(params: &HashMap<String, String>, field: &str) -> Option<RuleResult<u32>> {
    params.get(field).map(|raw| {
        integer_str(raw, field)
            .and_then(|n| min(n, 1, field))
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
    })
}

fn parse_query(
    params: &HashMap<String, String>,
) -> Result<SensorQuery, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let status = errors.check(
        "status",
        params.get("status").map(|s| exact_status(s)).transpose(),
    );
    let limit = errors.check("limit", positive(params, "limit").transpose());
    let page = errors.check("page", positive(params, "page").transpose());

    errors.into_result()?;
    Ok(SensorQuery {
        status: status.flatten(),
        limit: limit.flatten(),
        page: page.flatten(),
    })
}

async fn validate(state: &AppState, body: &Value) -> Result<CreateSensorRequest, ApiError> {
    let input = validation::object(body);
    let mut errors = ValidationErrors::new();

    let status = errors.check(
        "status",
        required(&input, "status")
            .and_then(|v| string(v, "status"))
            .and_then(|s| one_of(s.parse::<SensorStatus>(), "status")),
    );

    let mut location_id = errors.check(
        "location_id",
        required(&input, "location_id")
            .and_then(|v| string(v, "location_id"))
            .and_then(|s| uuid(s, "location_id")),
    );
    if let Some(id) = location_id {
        let exists = state
            .locations
            .exists(id)
            .await
            .map_err(ApiError::failed(CREATE_FAILED))?;
        if !exists {
            errors.add(
                "location_id",
                ValidationError::Invalid {
                    field: "location_id".to_string(),
                },
            );
            location_id = None;
        }
    }

    let name = errors.check(
        "name",
        required(&input, "name")
            .and_then(|v| string(v, "name"))
            .and_then(|s| max_chars(s, SENSOR_NAME_MAX_LEN, "name")),
    );
    if let (Some(name), Some(location_id)) = (name, location_id) {
        let taken = state
            .sensors
            .name_taken(location_id, name)
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

    match (name, status, location_id) {
        (Some(name), Some(status), Some(location_id)) if errors.is_empty() => {
            Ok(CreateSensorRequest {
                name: name.to_string(),
                status,
                location_id: location_id.to_string(),
            })
        }
        _ => Err(errors.into()),
    }
}
