use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

/// Cache policy shared by the caching services.
///
/// All durations are whole seconds. `counter_threshold` is the access count
/// at which a visitor query key switches from direct reads to cached reads.
/// `max_entries` bounds the in-memory store; the least useful entries are
/// evicted past it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: u64,
    pub counter_ttl: u64,
    pub counter_threshold: i64,
    pub max_entries: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }

    pub fn counter_ttl(&self) -> Duration {
        Duration::from_secs(self.counter_ttl)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            counter_ttl: DEFAULT_CACHE_COUNTER_TTL,
            counter_threshold: DEFAULT_CACHE_COUNTER_THRESHOLD,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: Some(DEFAULT_MAX_CONNECTIONS),
            },
            web: WebConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the
    /// process environment.
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_file, std::env::vars().collect())
    }

    /// Load configuration against an explicit environment map.
    ///
    /// Precedence, lowest first: built-in defaults, the TOML file (when it
    /// exists), `VISITOR_TRACKER__SECTION__KEY` variables, then the bare
    /// `CACHE_TTL`, `CACHE_COUNTER_TTL` and `CACHE_COUNTER_THRESHOLD`.
    pub fn load_with_env(config_file: Option<&str>, env: HashMap<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .set_default("database.max_connections", DEFAULT_MAX_CONNECTIONS as i64)?
            .set_default("web.host", DEFAULT_HOST)?
            .set_default("web.port", DEFAULT_PORT as i64)?
            .set_default("cache.ttl", DEFAULT_CACHE_TTL as i64)?
            .set_default("cache.counter_ttl", DEFAULT_CACHE_COUNTER_TTL as i64)?
            .set_default("cache.counter_threshold", DEFAULT_CACHE_COUNTER_THRESHOLD)?
            .set_default("cache.max_entries", DEFAULT_CACHE_MAX_ENTRIES as i64)?;

        if let Some(path) = config_file {
            builder = builder.add_source(
                config::File::new(path, config::FileFormat::Toml).required(false),
            );
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .source(Some(env.clone())),
            )
            .set_override_option("cache.ttl", env.get(ENV_CACHE_TTL).cloned())?
            .set_override_option("cache.counter_ttl", env.get(ENV_CACHE_COUNTER_TTL).cloned())?
            .set_override_option(
                "cache.counter_threshold",
                env.get(ENV_CACHE_COUNTER_THRESHOLD).cloned(),
            )?;

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cache.counter_threshold < 1 {
            anyhow::bail!(
                "cache.counter_threshold must be at least 1, got {}",
                self.cache.counter_threshold
            );
        }
        if self.cache.counter_ttl == 0 {
            anyhow::bail!("cache.counter_ttl must be greater than zero");
        }
        if self.cache.max_entries == 0 {
            anyhow::bail!("cache.max_entries must be greater than zero");
        }
        Ok(())
    }
}
