//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

/// `GET /api/health` — liveness plus database reachability.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let database = match ctx.core.open_db() {
        Ok(conn) => conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Health check cannot open database");
            false
        }
    };

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        version: crate::config::APP_VERSION,
    })
}
