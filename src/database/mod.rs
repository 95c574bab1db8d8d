use crate::assets::MigrationAssets;
use crate::config::DatabaseConfig;
use crate::errors::{RepositoryError, RepositoryResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    pub async fn new(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| RepositoryError::ConnectionFailed {
                message: format!("invalid database url {}: {}", config.url, e),
            })?
            .foreign_keys(true)
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database,
        // so the pool must hold exactly one connection for its whole life.
        let pool = if Self::is_in_memory(&config.url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.unwrap_or(10))
                .connect_with(options)
                .await
        }
        .map_err(|e| RepositoryError::ConnectionFailed {
            message: e.to_string(),
        })?;

        Ok(Self { pool })
    }

    /// Fresh, migrated in-memory database
    pub async fn in_memory() -> RepositoryResult<Self> {
        let database = Self::new(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
        })
        .await?;
        database.migrate().await?;
        Ok(database)
    }

    fn is_in_memory(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }

    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                execution_time BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for (name, content) in MigrationAssets::get_migrations() {
            // "001_initial_schema.sql" -> 1
            let version: i64 = name
                .split('_')
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| RepositoryError::MigrationFailed {
                    version: name.clone(),
                    message: "migration file name has no numeric version prefix".to_string(),
                })?;

            let applied = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            )
            .bind(version)
            .fetch_one(&self.pool)
            .await?;

            if applied > 0 {
                debug!("Migration {} already applied", name);
                continue;
            }

            let start = Instant::now();
            let mut transaction = self.pool.begin().await?;

            for statement in content.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                if let Err(e) = sqlx::query(statement).execute(&mut *transaction).await {
                    transaction.rollback().await?;
                    return Err(RepositoryError::MigrationFailed {
                        version: name,
                        message: e.to_string(),
                    });
                }
            }

            let execution_time = start.elapsed().as_millis() as i64;
            sqlx::query(
                "INSERT INTO schema_migrations (version, description, execution_time) VALUES (?, ?, ?)",
            )
            .bind(version)
            .bind(&name)
            .bind(execution_time)
            .execute(&mut *transaction)
            .await?;

            transaction.commit().await?;
            info!("Applied migration: {} ({}ms)", name, execution_time);
        }

        Ok(())
    }

    /// Round-trip a trivial query through the pool
    pub async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
