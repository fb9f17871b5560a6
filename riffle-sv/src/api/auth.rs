//! Bearer authentication gate
//!
//! The authentication mechanism itself lives outside this system; the API
//! consumes it as a boolean gate on a bearer credential. Requests to the
//! protected routes must carry `Authorization: Bearer <token>` matching the
//! configured API token. An unset token disables the gate entirely.

use crate::error::Error;
use crate::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

/// True when the request's bearer credential passes the gate.
pub fn bearer_matches(expected: &Option<String>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        // Gate disabled
        return true;
    };

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

/// Middleware applied to the protected `/api/*` routes.
///
/// The health and auth-status endpoints do NOT use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    if !bearer_matches(&state.api_token, request.headers()) {
        warn!(path = %request.uri().path(), "Rejected request without valid bearer credential");
        return Err(Error::Unauthorized);
    }

    Ok(next.run(request).await)
}
