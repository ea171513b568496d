use std::time::Duration;

use crate::db::{with_deadline, AccommodationStore, StoreResult};
use crate::models::AccommodationStats;

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn AccommodationStore,
    deadline: Duration,
) -> StoreResult<AccommodationStats> {
    with_deadline(deadline, store.fetch_stats()).await
}
