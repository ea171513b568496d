//! Accommodation API routes
//!
//! # Route Structure
//!
//! - `GET /api/v1/accommodations` - Paginated listing (page, limit, sort, order)
//! - `GET /api/v1/accommodations/search` - Listing with exact-match and range filters
//! - `GET /api/v1/accommodations/stats` - Aggregate figures
//! - `GET /api/v1/accommodations/:id` - A single accommodation
//!
//! Validation failures answer `400` with a `details` map naming every offending parameter.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::params::{ListAccommodationsQuery, SearchAccommodationsQuery};
use super::queries::{self, SearchAccommodationsResponse};
use super::types::AccommodationItem;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::models::AccommodationStats;

/// Creates the accommodations router
///
/// `/search` and `/stats` are static segments, so axum matches them before `/:id`.
pub fn accommodations_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_accommodations))
        .route("/search", get(search_accommodations))
        .route("/stats", get(accommodation_stats))
        .route("/:id", get(get_accommodation))
}

#[tracing::instrument(skip(state))]
async fn list_accommodations(
    State(state): State<FeatureState>,
    Query(query): Query<ListAccommodationsQuery>,
) -> Result<Json<SearchAccommodationsResponse>, AppError> {
    let params = query.validate()?;
    let response =
        queries::search::handle(state.store.as_ref(), &params, state.query_timeout).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state))]
async fn search_accommodations(
    State(state): State<FeatureState>,
    Query(query): Query<SearchAccommodationsQuery>,
) -> Result<Json<SearchAccommodationsResponse>, AppError> {
    let params = query.validate()?;
    let response =
        queries::search::handle(state.store.as_ref(), &params, state.query_timeout).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state))]
async fn accommodation_stats(
    State(state): State<FeatureState>,
) -> Result<Json<AccommodationStats>, AppError> {
    let stats = queries::stats::handle(state.store.as_ref(), state.query_timeout).await?;
    Ok(Json(stats))
}

/// The id is taken as text so a non-numeric value gets this API's own 400 body
#[tracing::instrument(skip(state))]
async fn get_accommodation(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
) -> Result<Json<AccommodationItem>, AppError> {
    let id: i32 = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid ID parameter".to_string()))?;

    queries::get::handle(state.store.as_ref(), id, state.query_timeout)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Accommodation not found".to_string()))
}
