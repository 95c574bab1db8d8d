/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./visitor-tracker.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

// Cache defaults (seconds unless noted)
pub const DEFAULT_CACHE_TTL: u64 = 600;
pub const DEFAULT_CACHE_COUNTER_TTL: u64 = 86400;
pub const DEFAULT_CACHE_COUNTER_THRESHOLD: i64 = 10;
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;

// Environment
pub const ENV_PREFIX: &str = "VISITOR_TRACKER";
pub const ENV_CACHE_TTL: &str = "CACHE_TTL";
pub const ENV_CACHE_COUNTER_TTL: &str = "CACHE_COUNTER_TTL";
pub const ENV_CACHE_COUNTER_THRESHOLD: &str = "CACHE_COUNTER_THRESHOLD";
