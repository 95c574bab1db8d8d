//! Web layer module
//!
//! HTTP interface for the visitor tracker. Handlers stay thin: they validate
//! input at the boundary and delegate to the service layer, which owns the
//! caching policy.

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    cache::Cache,
    config::Config,
    database::Database,
    metrics::TracingErrorReporter,
    repositories::{LocationRepository, SensorRepository, VisitorRepository},
    services::{LocationService, SensorService, SummaryService, VisitorService},
    utils::IdGenerator,
};

pub mod handlers;
pub mod responses;
pub mod validation;

pub use responses::{ApiError, ApiResponse, ApiResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
    pub locations: Arc<LocationService>,
    pub sensors: Arc<SensorService>,
    pub visitors: Arc<VisitorService>,
    pub summary: Arc<SummaryService>,
    pub reporter: TracingErrorReporter,
}

impl AppState {
    /// Wire repositories and services over one database and one cache
    pub fn new(config: Config, database: Database, cache: Cache, ids: Arc<dyn IdGenerator>) -> Self {
        let pool = database.pool();
        let reporter = TracingErrorReporter::new();
        let cache_config = config.cache;

        Self {
            locations: Arc::new(LocationService::new(LocationRepository::new(
                pool.clone(),
                ids.clone(),
            ))),
            sensors: Arc::new(SensorService::new(
                SensorRepository::new(pool.clone(), ids.clone()),
                cache.clone(),
                cache_config,
            )),
            visitors: Arc::new(VisitorService::new(
                VisitorRepository::new(pool.clone(), ids.clone()),
                cache.clone(),
                cache_config,
                Arc::new(reporter.clone()),
            )),
            summary: Arc::new(SummaryService::new(
                VisitorRepository::new(pool, ids),
                cache,
                cache_config,
            )),
            reporter,
            database,
            config,
        }
    }
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", state.config.web.host, state.config.web.port).parse()?;
        let app = Self::router(state);

        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health::health_check))
            .nest("/api", Self::api_routes())
            // Middleware (applied in reverse order)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    fn api_routes() -> Router<AppState> {
        Router::new()
            .route(
                "/locations",
                get(handlers::locations::index).post(handlers::locations::store),
            )
            .route(
                "/sensors",
                get(handlers::sensors::index).post(handlers::sensors::store),
            )
            .route(
                "/visitors",
                get(handlers::visitors::index).post(handlers::visitors::store),
            )
            .route("/summary", get(handlers::summary::show))
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}
