//! Static bearer-token authentication
//!
//! Terminals are provisioned with a single shared token. Every endpoint
//! except the liveness probe requires `Authorization: Bearer <token>` with an
//! exact match; rejection happens before any request processing.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header value
///
/// The remainder is compared verbatim; a token padded with whitespace does
/// not match.
fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// Middleware requiring the configured sync token
pub async fn require_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer);

    match token {
        Some(token) if token == state.sync_token() => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!(uri = %req.uri(), "Rejected request with wrong token");
            Err(AppError::Unauthorized)
        }
        None => {
            tracing::warn!(uri = %req.uri(), "Rejected request without bearer token");
            Err(AppError::Unauthorized)
        }
    }
}
