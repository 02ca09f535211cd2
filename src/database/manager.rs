use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors surfaced by the stores
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("record not found")]
    NotFound,

    #[error("edit conflict")]
    EditConflict,

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("query timed out")]
    Timeout,

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => DatabaseError::NotFound,
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Owns the connection pool and the per-query deadline
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pool: PgPool,
    query_timeout: Duration,
    log_queries: bool,
}

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;

        info!("Created database pool for: {}", Self::describe_url(&config.url));
        Ok(Self::from_pool(pool, config))
    }

    pub fn from_pool(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            query_timeout: config.query_timeout(),
            log_queries: config.enable_query_logging,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs a query future under the configured deadline.
    ///
    /// A query that overruns fails with [`DatabaseError::Timeout`] and its
    /// partial work is dropped.
    pub async fn run<T, F>(&self, query: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(DatabaseError::from),
            Err(_) => Err(DatabaseError::Timeout),
        }
    }

    pub fn log_query(&self, sql: &str) {
        if self.log_queries {
            debug!(sql, "executing query");
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.run(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Host, port and database name of a connection URL, without credentials.
    pub fn describe_url(raw: &str) -> String {
        match url::Url::parse(raw) {
            Ok(url) => format!(
                "{}:{}{}",
                url.host_str().unwrap_or("localhost"),
                url.port().unwrap_or(5432),
                url.path()
            ),
            Err(_) => "<invalid database url>".to_string(),
        }
    }
}
