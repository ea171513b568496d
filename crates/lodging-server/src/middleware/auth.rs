//! HTTP basic authentication for the admin route

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;

use crate::api::response::ErrorResponse;
use crate::config::AuthConfig;

const REALM: &str = r#"Basic realm="Restricted""#;

/// Constant-time comparison of two strings
fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Extract `(username, password)` from an `Authorization: Basic ...` header
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    let mut response =
        ErrorResponse::new("Unauthorized").into_response_with(StatusCode::UNAUTHORIZED);
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    response
}

/// Reject requests whose basic credentials do not match `expected`
pub async fn require_basic_auth(
    State(expected): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = basic_credentials(request.headers())
        .map(|(username, password)| {
            // Evaluate both so a wrong username takes as long as a wrong password
            let user_ok = constant_time_str_eq(&username, &expected.username);
            let pass_ok = constant_time_str_eq(&password, &expected.password);
            user_ok & pass_ok
        })
        .unwrap_or(false);

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request with bad credentials");
        return unauthorized();
    }

    next.run(request).await
}
