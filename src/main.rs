use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visitor_tracker::{
    cache::Cache,
    config::Config,
    database::Database,
    utils::UuidV4Generator,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "visitor-tracker")]
#[command(version = "0.1.0")]
#[command(about = "Location, sensor and visitor-count API with read-through caching")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("visitor_tracker={},tower_http=trace", cli.log_level)
    } else {
        format!("visitor_tracker={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Visitor Tracker v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(Some(&cli.config))?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    info!("Using database: {}", config.database.url);

    let database = Database::new(&config.database).await?;
    database.migrate().await?;
    info!("Database connection established and migrations applied");

    let cache = Cache::in_memory_with_capacity(config.cache.max_entries);
    info!(
        ttl = config.cache.ttl,
        counter_ttl = config.cache.counter_ttl,
        counter_threshold = config.cache.counter_threshold,
        max_entries = config.cache.max_entries,
        "Cache initialized"
    );

    let state = AppState::new(config, database, cache, Arc::new(UuidV4Generator));
    let web_server = WebServer::new(state)?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );
    web_server.serve().await?;

    Ok(())
}
