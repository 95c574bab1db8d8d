//! Summary endpoint

use axum::extract::State;

use crate::web::responses::{ok, ApiError, ApiResult, DEFAULT_SUCCESS_MESSAGE};
use crate::web::AppState;

/// Visitor total for the last seven days and sensor counts by status
pub async fn show(State(state): State<AppState>) -> ApiResult {
    let summary = state
        .summary
        .get()
        .await
        .map_err(ApiError::failed("Failed to fetch summary statistics"))?;
    Ok(ok(summary, DEFAULT_SUCCESS_MESSAGE))
}
