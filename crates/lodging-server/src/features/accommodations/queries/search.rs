use std::time::Duration;

use crate::db::{with_deadline, AccommodationStore, StoreResult};
use crate::features::accommodations::params::SearchParams;
use crate::features::accommodations::query_builder::compile;
use crate::features::accommodations::types::AccommodationItem;
use crate::features::shared::pagination::Paginated;

pub type SearchAccommodationsResponse = Paginated<AccommodationItem>;

/// Run one page of a listing. Both statements run concurrently under a single deadline.
#[tracing::instrument(
    skip(store, params),
    fields(page = params.page.page(), limit = params.page.limit())
)]
pub async fn handle(
    store: &dyn AccommodationStore,
    params: &SearchParams,
    deadline: Duration,
) -> StoreResult<SearchAccommodationsResponse> {
    let compiled = compile(params);

    let (total, rows) = with_deadline(deadline, async {
        tokio::try_join!(
            store.fetch_count(&compiled.count),
            store.fetch_rows(&compiled.data)
        )
    })
    .await?;

    tracing::debug!(total, returned = rows.len(), "Accommodation page fetched");

    Ok(Paginated::new(rows, &compiled.page, total).map(AccommodationItem::from))
}
