use serde::{Deserialize, Serialize};

/// Visitor totals over the trailing window plus sensor counts by status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub total_visitors_last_7_days: i64,
    pub sensor_stats: SensorStats,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SensorStats {
    pub active: i64,
    pub inactive: i64,
}
