use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Database pool is not initialized")]
    NotInitialized,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Holds the process-wide connection pool of the console database
pub struct DatabaseManager;

static POOL: OnceLock<PgPool> = OnceLock::new();

impl DatabaseManager {
    /// Connect once using the configured URL. Later calls return the existing pool.
    pub async fn init(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if let Some(pool) = POOL.get() {
            return Ok(pool.clone());
        }

        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;

        info!("Created database pool for: {}", parsed.path().trim_start_matches('/'));
        Ok(POOL.get_or_init(|| pool).clone())
    }

    pub fn pool() -> Result<PgPool, DatabaseError> {
        POOL.get().cloned().ok_or(DatabaseError::NotInitialized)
    }

    pub fn is_initialized() -> bool {
        POOL.get().is_some()
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }
}
