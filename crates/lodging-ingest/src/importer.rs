//! Batched import into PostgreSQL
//!
//! Rows are written in batches, one transaction per batch, so an interrupted import keeps every
//! batch committed before the failure. Rows whose registry number is already present are
//! skipped, which makes re-running an import over the same export harmless.

use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use lodging_common::schema::{ACCOMMODATIONS_TABLE, SCHEMA_STATEMENTS};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::record::NewAccommodation;

pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Inserted columns, in bind order
pub const INSERT_COLUMNS: [&str; 21] = [
    "object_id",
    "external_id",
    "name",
    "registered_at",
    "opened_at",
    "category",
    "capacity",
    "owner_email",
    "address",
    "postal_code",
    "locality",
    "latitude",
    "longitude",
    "geo_reliability",
    "parish",
    "municipality",
    "district",
    "nuts_iii",
    "nuts_ii",
    "tourism_region",
    "clean_safe_seal",
];

/// PostgreSQL accepts at most 65535 bind parameters per statement
const MAX_BIND_PARAMS: usize = 65_535;

/// Largest number of rows one INSERT can carry
pub const MAX_ROWS_PER_STATEMENT: usize = MAX_BIND_PARAMS / INSERT_COLUMNS.len();

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    /// Rows whose registry number was already present
    pub skipped: usize,
    pub elapsed: Duration,
}

impl ImportSummary {
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total as f64 / secs
        } else {
            0.0
        }
    }
}

/// Create the table and its indexes when missing
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!(table = ACCOMMODATIONS_TABLE, "Database schema ready");
    Ok(())
}

/// Multi-row INSERT for `rows`. Callers keep `rows` within [`MAX_ROWS_PER_STATEMENT`].
pub fn insert_statement(rows: &[NewAccommodation]) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        ACCOMMODATIONS_TABLE,
        INSERT_COLUMNS.join(", ")
    ));

    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.object_id)
            .push_bind(row.external_id)
            .push_bind(row.name.as_deref())
            .push_bind(row.registered_at)
            .push_bind(row.opened_at)
            .push_bind(row.category.as_deref())
            .push_bind(row.capacity)
            .push_bind(row.owner_email.as_deref())
            .push_bind(row.address.as_deref())
            .push_bind(row.postal_code.as_deref())
            .push_bind(row.locality.as_deref())
            .push_bind(row.latitude)
            .push_bind(row.longitude)
            .push_bind(row.geo_reliability.as_deref())
            .push_bind(row.parish.as_deref())
            .push_bind(row.municipality.as_deref())
            .push_bind(row.district.as_deref())
            .push_bind(row.nuts_iii.as_deref())
            .push_bind(row.nuts_ii.as_deref())
            .push_bind(row.tourism_region.as_deref())
            .push_bind(row.clean_safe_seal.as_deref());
    });
    builder.push(" ON CONFLICT (external_id) DO NOTHING");

    builder
}

/// Import `records` in transactions of `batch_size` rows, advancing `progress` per batch
pub async fn import(
    pool: &PgPool,
    records: &[NewAccommodation],
    batch_size: usize,
    progress: &ProgressBar,
) -> Result<ImportSummary> {
    if batch_size == 0 {
        return Err(IngestError::InvalidBatchSize);
    }

    let start = Instant::now();
    let mut summary = ImportSummary {
        total: records.len(),
        ..Default::default()
    };
    let rows_per_statement = batch_size.min(MAX_ROWS_PER_STATEMENT);

    for batch in records.chunks(batch_size) {
        let mut tx = pool.begin().await?;
        let mut inserted = 0usize;

        for rows in batch.chunks(rows_per_statement) {
            let result = insert_statement(rows).build().execute(&mut *tx).await?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;

        summary.imported += inserted;
        summary.skipped += batch.len() - inserted;
        progress.inc(batch.len() as u64);

        debug!(
            batch = batch.len(),
            inserted,
            imported = summary.imported,
            skipped = summary.skipped,
            "Batch committed"
        );
    }

    summary.elapsed = start.elapsed();
    Ok(summary)
}
