use std::time::Duration;

use crate::db::{with_deadline, AccommodationStore, StoreResult};
use crate::features::accommodations::types::AccommodationItem;

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn AccommodationStore,
    id: i32,
    deadline: Duration,
) -> StoreResult<Option<AccommodationItem>> {
    let record = with_deadline(deadline, store.fetch_by_id(id)).await?;
    Ok(record.map(AccommodationItem::from))
}
