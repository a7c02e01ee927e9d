//! Patient health record endpoints.
//!
//! - `GET /api/health-records?patient_id=...`
//! - `POST /api/health-records`
//! - `GET|DELETE /api/health-records/:id`

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::health_records::{self, HealthRecordInput};
use crate::models::{HealthRecord, HealthRecordFilter, Page, RecordType};

#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub patient_id: Option<String>,
    pub record_type: Option<RecordType>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/health-records` — `patient_id` is required.
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<RecordsQuery>, QueryRejection>,
) -> Result<Json<Vec<HealthRecord>>, ApiError> {
    let Query(query) = query?;
    let filter = HealthRecordFilter {
        patient_id: query.patient_id.unwrap_or_default().trim().to_string(),
        record_type: query.record_type,
        page: Page::new(query.limit, query.offset),
    };
    let conn = ctx.core.open_db()?;
    Ok(Json(health_records::list_records(&conn, &filter)?))
}

/// `POST /api/health-records`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<HealthRecordInput>, JsonRejection>,
) -> Result<(StatusCode, Json<HealthRecord>), ApiError> {
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let record = health_records::create_record(&conn, input)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/health-records/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<HealthRecord>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(health_records::get_record(&conn, &id)?))
}

/// `DELETE /api/health-records/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    health_records::delete_record(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
