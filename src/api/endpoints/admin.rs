//! Admin endpoints, behind the admin bearer token.
//!
//! - `GET /api/admin/analytics`
//! - `PATCH /api/admin/labs/:id/status` — approve, reject or suspend

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::analytics::{self, PlatformAnalytics};
use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::labs;
use crate::models::{Lab, LabStatus};

#[derive(Debug, Deserialize)]
pub struct LabStatusChange {
    pub status: LabStatus,
}

/// `GET /api/admin/analytics`
pub async fn analytics(State(ctx): State<ApiContext>) -> Result<Json<PlatformAnalytics>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(analytics::platform_analytics(&conn)?))
}

/// `PATCH /api/admin/labs/:id/status`
pub async fn set_lab_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<LabStatusChange>, JsonRejection>,
) -> Result<Json<Lab>, ApiError> {
    let id = parse_id(&id)?;
    let Json(change) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(labs::set_lab_status(&conn, &id, change.status)?))
}
