//! Admin bearer-token middleware.
//!
//! Extracts `Authorization: Bearer <token>` and compares it with the
//! configured admin token. Without a configured token every admin
//! request is rejected.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{token_matches, ApiContext};

/// Require the admin bearer token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_admin_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_admin_inner(
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let expected = ctx.core.config.admin_token.as_deref().ok_or_else(|| {
        tracing::warn!("Admin request rejected: EKITSA_ADMIN_TOKEN not set");
        ApiError::Unauthorized
    })?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    if !token_matches(token.trim(), expected) {
        tracing::warn!(path = %req.uri().path(), "Admin request with invalid token");
        return Err(ApiError::Unauthorized);
    }

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}
