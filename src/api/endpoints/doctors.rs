//! Doctor directory endpoints.
//!
//! - `GET|POST /api/doctors`
//! - `GET|PUT|DELETE /api/doctors/:id`

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::doctors::{self, DoctorInput, DoctorPatch};
use crate::models::{Doctor, DoctorFilter, Page};

#[derive(Debug, Default, Deserialize)]
pub struct DoctorsQuery {
    pub specialization: Option<String>,
    pub city: Option<String>,
    pub available: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/doctors`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<DoctorsQuery>, QueryRejection>,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    let Query(query) = query?;
    let filter = DoctorFilter {
        specialization: query.specialization,
        city: query.city,
        available: query.available,
        search: query.search,
        page: Page::new(query.limit, query.offset),
    };
    let conn = ctx.core.open_db()?;
    Ok(Json(doctors::list_doctors(&conn, &filter)?))
}

/// `POST /api/doctors`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DoctorInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let doctor = doctors::create_doctor(&conn, input)?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

/// `GET /api/doctors/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(doctors::get_doctor(&conn, &id)?))
}

/// `PUT /api/doctors/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<DoctorPatch>, JsonRejection>,
) -> Result<Json<Doctor>, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(doctors::update_doctor(&conn, &id, patch)?))
}

/// `DELETE /api/doctors/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    doctors::delete_doctor(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
