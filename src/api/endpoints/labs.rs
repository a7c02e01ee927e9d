//! Lab endpoints.
//!
//! - `GET /api/labs` — public listing, approved labs unless `status` is given
//! - `POST /api/labs` — register a lab (starts `pending`)
//! - `GET|PUT|DELETE /api/labs/:id`
//! - `GET /api/labs/:id/tests` — active tests of one lab

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::labs::{self, LabInput, LabPatch};
use crate::models::{Lab, LabFilter, LabStatus, LabTest, Page};

#[derive(Debug, Default, Deserialize)]
pub struct LabsQuery {
    pub city: Option<String>,
    pub search: Option<String>,
    pub status: Option<LabStatus>,
    pub home_collection: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/labs`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<LabsQuery>, QueryRejection>,
) -> Result<Json<Vec<Lab>>, ApiError> {
    let Query(query) = query?;
    let filter = LabFilter {
        city: query.city,
        search: query.search,
        status: Some(query.status.unwrap_or(LabStatus::Approved)),
        home_collection: query.home_collection,
        page: Page::new(query.limit, query.offset),
    };
    let conn = ctx.core.open_db()?;
    Ok(Json(labs::list_labs(&conn, &filter)?))
}

/// `POST /api/labs`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LabInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Lab>), ApiError> {
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let lab = labs::create_lab(&conn, input)?;
    Ok((StatusCode::CREATED, Json(lab)))
}

/// `GET /api/labs/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Lab>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(labs::get_lab(&conn, &id)?))
}

/// `PUT /api/labs/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<LabPatch>, JsonRejection>,
) -> Result<Json<Lab>, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(labs::update_lab(&conn, &id, patch)?))
}

/// `DELETE /api/labs/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    labs::delete_lab(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/labs/:id/tests`
pub async fn tests(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<LabTest>>, ApiError> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;
    let tests = labs::tests_for_lab(&conn, &id, Page::new(query.limit, query.offset))?;
    Ok(Json(tests))
}
