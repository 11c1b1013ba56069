use anyhow::{Context, Result};
use compass_core::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::repositories::PgDashboardSource;

/// Owns the process-wide connection pool.
///
/// Open it once at startup with [`DatabaseClient::connect`] and release it
/// with [`DatabaseClient::close`] on shutdown.
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the configured `PostgreSQL` host.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url())
            .await
            .with_context(|| format!("Failed to connect to database at {}", config.host))?;
        tracing::info!(host = %config.host, "connected to database");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Dashboard queries over this pool.
    #[must_use]
    pub fn dashboard_source(&self) -> PgDashboardSource {
        PgDashboardSource::new(self.pool.clone())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }
}
