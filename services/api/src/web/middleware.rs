//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::web::rest::{error_response, HandlerError};
use crate::web::state::AppState;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that verifies the bearer token and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// A missing or malformed header yields 401; a token that fails verification yields 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    // 1. Extract the bearer token
    let token = bearer_token(req.headers()).ok_or_else(|| {
        error_response(
            StatusCode::UNAUTHORIZED,
            "Missing token or invalid Authorization format",
        )
    })?;

    // 2. Verify it with the identity service, get user_id
    let user_id = state.identity.verify_token(token).await.map_err(|e| {
        warn!("Token verification failed: {}", e);
        error_response(StatusCode::FORBIDDEN, "Invalid token")
    })?;
    debug!(%user_id, "User verified");

    // 3. Insert user_id into request extensions
    req.extensions_mut().insert(user_id);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
