//! Test booking endpoints.
//!
//! - `GET|POST /api/bookings`
//! - `GET /api/bookings/:id`
//! - `PATCH /api/bookings/:id/status`

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::bookings::{self, BookingInput};
use crate::models::{BookingFilter, BookingStatus, Page, TestBooking};

#[derive(Debug, Default, Deserialize)]
pub struct BookingsQuery {
    pub lab_id: Option<Uuid>,
    pub patient_email: Option<String>,
    pub status: Option<BookingStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: BookingStatus,
}

/// `GET /api/bookings`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<BookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<TestBooking>>, ApiError> {
    let Query(query) = query?;
    let filter = BookingFilter {
        lab_id: query.lab_id,
        patient_email: query.patient_email,
        status: query.status,
        page: Page::new(query.limit, query.offset),
    };
    let conn = ctx.core.open_db()?;
    Ok(Json(bookings::list_bookings(&conn, &filter)?))
}

/// `POST /api/bookings`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<BookingInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TestBooking>), ApiError> {
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let booking = bookings::create_booking(&conn, input)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `GET /api/bookings/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<TestBooking>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(bookings::get_booking(&conn, &id)?))
}

/// `PATCH /api/bookings/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> Result<Json<TestBooking>, ApiError> {
    let id = parse_id(&id)?;
    let Json(change) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(bookings::update_booking_status(&conn, &id, change.status)?))
}
