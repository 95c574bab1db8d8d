//! Health check endpoint

use axum::{extract::State, response::Response};
use serde::Serialize;
use tracing::warn;

use crate::web::{responses::ok, AppState};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    /// Failures passed to the error reporter since startup
    pub reported_errors: u64,
}

/// Basic health status including database connectivity.
///
/// Always answers 200; an unreachable database shows up in the payload.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let reported_errors = state.reporter.reported_count();

    match state.database.health_check().await {
        Ok(()) => ok(
            HealthStatus {
                status: "healthy",
                database: "connected",
                reported_errors,
            },
            "Service is healthy",
        ),
        Err(e) => {
            warn!("Database health check failed: {}", e);
            ok(
                HealthStatus {
                    status: "unhealthy",
                    database: "disconnected",
                    reported_errors,
                },
                "Database connection failed",
            )
        }
    }
}
