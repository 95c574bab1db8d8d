use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const LOCATION_NAME_MAX_LEN: usize = 191;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
}
