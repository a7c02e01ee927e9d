//! Per-client rate limiting middleware for the chat route.
//!
//! Sliding-window limits per client key:
//! - 20 requests per minute
//! - 200 requests per hour

use axum::http::{HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::endpoints::chat::chat_error;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// First address in `X-Forwarded-For`, else `anonymous`.
fn rate_key(req: &Request<axum::body::Body>) -> String {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "anonymous".to_string())
}

/// 429 in the chat error shape, with `Retry-After`.
fn too_many_requests(retry_after: u64) -> Response {
    let mut response = chat_error(
        StatusCode::TOO_MANY_REQUESTS,
        "Too many requests, please try again later",
    );
    if let Ok(val) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert("Retry-After", val);
    }
    response
}

/// Per-client rate limiting. Returns 429 if exceeded.
/// Accesses `ApiContext` from request extensions.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    let ctx = match req.extensions().get::<ApiContext>().cloned() {
        Some(ctx) => ctx,
        None => return ApiError::Internal("missing API context".into()).into_response(),
    };

    let key = rate_key(&req);

    // MutexGuard is !Send, drop before .await
    let verdict = match ctx.rate_limiter.lock() {
        Ok(mut limiter) => limiter.check(&key),
        Err(_) => return ApiError::Internal("rate limiter lock".into()).into_response(),
    };

    if let Err(retry_after) = verdict {
        tracing::warn!(client = %key, retry_after, "Chat rate limit exceeded");
        return too_many_requests(retry_after);
    }

    next.run(req).await
}
