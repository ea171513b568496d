//! Database connection and storage access

pub mod store;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use store::{with_deadline, AccommodationStore, PgStore, StoreError, StoreResult};

/// Failure to bring up the connection pool
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}. Check DATABASE_URL and connection settings.")]
    Connect(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;

pub async fn create_pool(config: &DatabaseConfig) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}
