//! HTTP surface
//!
//! Assembles the feature routes, the operational endpoints and the middleware stack. Every
//! route, including `/health`, passes through the admission layer.

pub mod response;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::compression::CompressionLayer;

use crate::admission::AdmissionController;
use crate::config::{AuthConfig, CorsConfig};
use crate::db::{with_deadline, AccommodationStore};
use crate::features::{self, FeatureState};
use crate::middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccommodationStore>,
    pub admission: Arc<AdmissionController>,
    pub credentials: Arc<AuthConfig>,
    pub query_timeout: Duration,
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    let feature_state = FeatureState {
        store: Arc::clone(&state.store),
        query_timeout: state.query_timeout,
    };

    let admin = get(admin_area).layer(from_fn_with_state(
        Arc::clone(&state.credentials),
        middleware::require_basic_auth,
    ));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/admin", admin)
        .with_state(state.clone())
        .nest("/api/v1", features::router(feature_state))
        // Apply layers from innermost to outermost
        .layer(from_fn_with_state(
            Arc::clone(&state.admission),
            middleware::rate_limit,
        ))
        .layer(CompressionLayer::new())
        .layer(middleware::cors_layer(cors))
        .layer(middleware::tracing_layer())
}

/// Liveness: the process is up and serving
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Readiness: storage answers within the request deadline
async fn readiness_check(State(state): State<AppState>) -> Response {
    match with_deadline(state.query_timeout, state.store.ping()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "connected",
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Database readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not ready",
                    "database": "disconnected",
                })),
            )
                .into_response()
        },
    }
}

/// Reachable only with valid basic credentials
async fn admin_area() -> &'static str {
    "admin"
}
