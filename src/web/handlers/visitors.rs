//! Visitor endpoints

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{query_params, QueryParams};
use crate::models::{CreateVisitorRequest, VisitorRecord};
use crate::web::responses::{created, ok, ApiError, ApiResult, DEFAULT_SUCCESS_MESSAGE};
use crate::web::validation::{
    self, date_ymd, integer, min, required, string, uuid, ValidationError, ValidationErrors,
};
use crate::web::AppState;

const FETCH_FAILED: &str = "Failed to fetch visitors";
const CREATE_FAILED: &str = "Failed to create visitor";

/// Visitor record as rendered by the API, flattened with its sensor's location
#[derive(Debug, Clone, Serialize)]
pub struct VisitorResource {
    pub id: String,
    pub location_id: Option<String>,
    pub sensor_id: String,
    pub date: NaiveDate,
    pub count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VisitorRecord> for VisitorResource {
    fn from(record: VisitorRecord) -> Self {
        Self {
            location_id: record.location_id().map(str::to_string),
            id: record.id,
            sensor_id: record.sensor_id,
            date: record.date,
            count: record.count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// List visitor records, optionally for a single day
pub async fn index(State(state): State<AppState>, params: QueryParams) -> ApiResult {
    let params = query_params(params)?;

    let mut errors = ValidationErrors::new();
    let date = errors.check(
        "date",
        params.get("date").map(|d| date_ymd(d, "date")).transpose(),
    );
    errors.into_result()?;

    let visitors = state
        .visitors
        .fetch(date.flatten())
        .await
        .map_err(ApiError::failed(FETCH_FAILED))?;

    let resources: Vec<VisitorResource> = visitors.into_iter().map(VisitorResource::from).collect();
    Ok(ok(resources, DEFAULT_SUCCESS_MESSAGE))
}

/// Record a sensor's visitor count for one day
pub async fn store(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let request = validate(&state, &body).await?;

    let record = state
        .visitors
        .create(request)
        .await
        .map_err(ApiError::failed(CREATE_FAILED))?;
    Ok(created(VisitorResource::from(record), "Visitor created"))
}

async fn validate(state: &AppState, body: &Value) -> Result<CreateVisitorRequest, ApiError> {
    let input = validation::object(body);
    let mut errors = ValidationErrors::new();

    let mut sensor_id = errors.check(
        "sensor_id",
        required(&input, "sensor_id")
            .and_then(|v| string(v, "sensor_id"))
            .and_then(|s| uuid(s, "sensor_id")),
    );
    if let Some(id) = sensor_id {
        let exists = state
            .sensors
            .exists(id)
            .await
            .map_err(ApiError::failed(CREATE_FAILED))?;
        if !exists {
            errors.add(
                "sensor_id",
                ValidationError::Invalid {
                    field: "sensor_id".to_string(),
                },
            );
            sensor_id = None;
        }
    }

    let date = errors.check(
        "date",
        required(&input, "date")
            .and_then(|v| string(v, "date"))
            .and_then(|s| date_ymd(s, "date")),
    );
    if let (Some(sensor_id), Some(date)) = (sensor_id, date) {
        let recorded = state
            .visitors
            .is_recorded(sensor_id, date)
            .await
            .map_err(ApiError::failed(CREATE_FAILED))?;
        if recorded {
            errors.add(
                "date",
                ValidationError::Taken {
                    field: "date".to_string(),
                },
            );
        }
    }

    let count = errors.check(
        "count",
        required(&input, "count")
            .and_then(|v| integer(v, "count"))
            .and_then(|n| min(n, 0, "count")),
    );

    match (sensor_id, date, count) {
        (Some(sensor_id), Some(date), Some(count)) if errors.is_empty() => {
            Ok(CreateVisitorRequest {
                sensor_id: sensor_id.to_string(),
                date,
                count,
            })
        }
        _ => Err(errors.into()),
    }
}
