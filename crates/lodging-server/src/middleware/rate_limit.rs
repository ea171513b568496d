//! Per-client rate limiting at the HTTP edge
//!
//! Runs before any parameter parsing or storage work. The client is identified by the peer
//! address, so the server must be started with `into_make_service_with_connect_info`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::admission::{AdmissionController, ClientKey};
use crate::api::response::ErrorResponse;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Answer `429` once the caller's bucket is empty
pub async fn rate_limit(
    State(admission): State<Arc<AdmissionController>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let key = ClientKey::from_addr(&addr);

    if !admission.allow(&key) {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        return ErrorResponse::new(RATE_LIMIT_MESSAGE)
            .into_response_with(StatusCode::TOO_MANY_REQUESTS);
    }

    next.run(request).await
}
