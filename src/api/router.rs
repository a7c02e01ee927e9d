//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Layers (outermost → innermost):
//! 1. CORS → 2. Request log → 3. Admin guard (admin routes) or
//!    rate limit (chat route)

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with all endpoints under `/api/`.
///
/// Middleware uses `Extension<ApiContext>` (injected outside the guards).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    use endpoints::*;

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let public = Router::new()
        .route("/health", get(health::check))
        .route("/labs", get(labs::list).post(labs::create))
        .route(
            "/labs/:id",
            get(labs::detail).put(labs::update).delete(labs::remove),
        )
        .route("/labs/:id/tests", get(labs::tests))
        .route("/tests", get(lab_tests::list).post(lab_tests::create))
        .route(
            "/tests/:id",
            get(lab_tests::detail)
                .put(lab_tests::update)
                .delete(lab_tests::remove),
        )
        .route("/doctors", get(doctors::list).post(doctors::create))
        .route(
            "/doctors/:id",
            get(doctors::detail)
                .put(doctors::update)
                .delete(doctors::remove),
        )
        .route("/blog", get(blog::list).post(blog::create))
        .route(
            "/blog/:key",
            get(blog::detail).put(blog::update).delete(blog::remove),
        )
        .route("/blog/:key/publish", post(blog::publish))
        .route(
            "/health-records",
            get(health_records::list).post(health_records::create),
        )
        .route(
            "/health-records/:id",
            get(health_records::detail).delete(health_records::remove),
        )
        .route("/bookings", get(bookings::list).post(bookings::create))
        .route("/bookings/:id", get(bookings::detail))
        .route("/bookings/:id/status", patch(bookings::set_status))
        .route(
            "/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route("/appointments/:id", get(appointments::detail))
        .route("/appointments/:id/status", patch(appointments::set_status))
        .route("/lab-owner/onboarding", post(lab_owner::start))
        .route("/lab-owner/onboarding/:id", get(lab_owner::detail))
        .route(
            "/lab-owner/onboarding/:id/steps/:step",
            put(lab_owner::save_step),
        )
        .route("/lab-owner/onboarding/:id/submit", post(lab_owner::submit))
        .route("/lab-owner/labs/:id/dashboard", get(lab_owner::dashboard))
        .with_state(ctx.clone());

    // Admin routes — bearer token. route_layer keeps unknown paths at 404.
    let admin = Router::new()
        .route("/admin/analytics", get(admin::analytics))
        .route("/admin/labs/:id/status", patch(admin::set_lab_status))
        .with_state(ctx.clone())
        .route_layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::Extension(ctx.clone()));

    // Chat — rate-limited per client
    let chat = Router::new()
        .route("/chat", post(chat::send))
        .with_state(ctx.clone())
        .route_layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    Router::new()
        .nest("/api", public.merge(admin).merge(chat))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(cors_layer(&ctx.core.config.cors_origins))
}

/// Any origin when none are configured, otherwise exactly the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
