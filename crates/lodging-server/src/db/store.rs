//! Read-only access to the accommodations table
//!
//! Handlers talk to storage through [`AccommodationStore`] so the HTTP layer can be exercised
//! against an in-memory implementation. [`PgStore`] is the PostgreSQL implementation used by
//! the binary.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::features::accommodations::query_builder::{SqlArg, Statement, PROJECTION};
use crate::models::{
    AccommodationRecord, AccommodationStats, CategoryCount, DistrictCount, MunicipalityCount,
    ACCOMMODATIONS_TABLE,
};

/// Storage operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Database query exceeded the {0:?} deadline")]
    Timeout(Duration),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AccommodationStore: Send + Sync {
    /// Run a `SELECT COUNT(*)` statement
    async fn fetch_count(&self, statement: &Statement) -> StoreResult<i64>;

    /// Run a statement selecting the full record projection
    async fn fetch_rows(&self, statement: &Statement) -> StoreResult<Vec<AccommodationRecord>>;

    async fn fetch_by_id(&self, id: i32) -> StoreResult<Option<AccommodationRecord>>;

    async fn fetch_stats(&self) -> StoreResult<AccommodationStats>;

    /// Cheap round trip used by readiness checks
    async fn ping(&self) -> StoreResult<()>;
}

/// Bound `fut` by `deadline`. Dropping the future on expiry releases any pooled connection it held.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(deadline)),
    }
}

macro_rules! bind_args {
    ($query:expr, $args:expr) => {{
        let mut query = $query;
        for arg in $args {
            query = match arg {
                SqlArg::Text(value) => query.bind(value.as_str()),
                SqlArg::Int(value) => query.bind(*value),
                SqlArg::Float(value) => query.bind(*value),
            };
        }
        query
    }};
}

const COUNT_ALL: &str = "SELECT COUNT(*) FROM accommodations";

const AVERAGE_CAPACITY: &str =
    "SELECT COALESCE(AVG(capacity), 0)::float8 FROM accommodations WHERE capacity IS NOT NULL";

const TOP_DISTRICTS: &str = r#"
    SELECT district, COUNT(*) AS count
    FROM accommodations
    WHERE district IS NOT NULL AND district <> ''
    GROUP BY district
    ORDER BY count DESC
    LIMIT 10
"#;

const TOP_MUNICIPALITIES: &str = r#"
    SELECT municipality, COUNT(*) AS count
    FROM accommodations
    WHERE municipality IS NOT NULL AND municipality <> ''
    GROUP BY municipality
    ORDER BY count DESC
    LIMIT 10
"#;

const BY_CATEGORY: &str = r#"
    SELECT category, COUNT(*) AS count
    FROM accommodations
    WHERE category IS NOT NULL AND category <> ''
    GROUP BY category
    ORDER BY count DESC
"#;

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccommodationStore for PgStore {
    async fn fetch_count(&self, statement: &Statement) -> StoreResult<i64> {
        let query = bind_args!(sqlx::query_scalar::<_, i64>(&statement.sql), &statement.args);
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn fetch_rows(&self, statement: &Statement) -> StoreResult<Vec<AccommodationRecord>> {
        let query = bind_args!(
            sqlx::query_as::<_, AccommodationRecord>(&statement.sql),
            &statement.args
        );
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn fetch_by_id(&self, id: i32) -> StoreResult<Option<AccommodationRecord>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", PROJECTION, ACCOMMODATIONS_TABLE);
        let record = sqlx::query_as::<_, AccommodationRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn fetch_stats(&self) -> StoreResult<AccommodationStats> {
        let (total_accommodations, average_capacity, by_district, by_municipality, by_category) =
            tokio::try_join!(
                sqlx::query_scalar::<_, i64>(COUNT_ALL).fetch_one(&self.pool),
                sqlx::query_scalar::<_, f64>(AVERAGE_CAPACITY).fetch_one(&self.pool),
                sqlx::query_as::<_, DistrictCount>(TOP_DISTRICTS).fetch_all(&self.pool),
                sqlx::query_as::<_, MunicipalityCount>(TOP_MUNICIPALITIES).fetch_all(&self.pool),
                sqlx::query_as::<_, CategoryCount>(BY_CATEGORY).fetch_all(&self.pool),
            )?;

        Ok(AccommodationStats {
            total_accommodations,
            average_capacity,
            by_district,
            by_municipality,
            by_category,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StoreError>(1)
        };

        let result = with_deadline(Duration::from_secs(1), slow).await;
        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_deadline_passes_through_result() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);

        let failed = with_deadline(Duration::from_secs(1), async {
            Err::<i64, _>(StoreError::Sqlx(sqlx::Error::PoolTimedOut))
        })
        .await;
        assert!(matches!(failed, Err(StoreError::Sqlx(_))));
    }
}
