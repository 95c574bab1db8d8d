use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SENSOR_NAME_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    Inactive,
}

impl SensorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Active => "active",
            SensorStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: `ACTIVE`, `Active` and `active` all parse.
impl FromStr for SensorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SensorStatus::Active),
            "inactive" => Ok(SensorStatus::Inactive),
            other => Err(format!("unknown sensor status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    pub status: SensorStatus,
    pub location_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSensorRequest {
    pub name: String,
    pub status: SensorStatus,
    pub location_id: String,
}

/// Minimal sensor view attached to visitor records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SensorProjection {
    pub id: String,
    pub location_id: String,
}
