use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::SensorProjection;

/// Daily visitor count reported by one sensor.
///
/// `sensor` is only populated when the read asked for the sensor
/// projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitorRecord {
    pub id: String,
    pub sensor_id: String,
    pub date: NaiveDate,
    pub count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<SensorProjection>,
}

impl VisitorRecord {
    /// Location of the reporting sensor, when the projection was loaded
    pub fn location_id(&self) -> Option<&str> {
        self.sensor.as_ref().map(|s| s.location_id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVisitorRequest {
    pub sensor_id: String,
    pub date: NaiveDate,
    pub count: i64,
}
