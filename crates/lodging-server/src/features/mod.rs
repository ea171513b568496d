//! Feature modules implementing the lodging API
//!
//! Each feature is a vertical slice:
//! - `queries/` - read operations against the store
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - response records
//!
//! The service is read-only, so there are no command slices.

pub mod accommodations;
pub mod shared;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::db::AccommodationStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub store: Arc<dyn AccommodationStore>,
    /// Deadline applied to the storage work of one request
    pub query_timeout: Duration,
}

/// Creates the API router with all feature routes mounted
///
/// - `/accommodations` - Accommodation listings, search, stats and lookup
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest(
        "/accommodations",
        accommodations::accommodations_routes().with_state(state),
    )
}
