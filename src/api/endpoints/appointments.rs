//! Doctor appointment endpoints.
//!
//! - `GET|POST /api/appointments`
//! - `GET /api/appointments/:id`
//! - `PATCH /api/appointments/:id/status`

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::appointments::{self, AppointmentInput};
use crate::models::{Appointment, AppointmentFilter, AppointmentStatus, Page};

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentsQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_email: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
}

/// `GET /api/appointments`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<AppointmentsQuery>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let Query(query) = query?;
    let filter = AppointmentFilter {
        doctor_id: query.doctor_id,
        patient_email: query.patient_email,
        status: query.status,
        page: Page::new(query.limit, query.offset),
    };
    let conn = ctx.core.open_db()?;
    Ok(Json(appointments::list_appointments(&conn, &filter)?))
}

/// `POST /api/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<AppointmentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let Json(input) = payload?;
    let conn = ctx.core.open_db()?;
    let appointment = appointments::create_appointment(&conn, input)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(appointments::get_appointment(&conn, &id)?))
}

/// `PATCH /api/appointments/:id/status`
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> Result<Json<Appointment>, ApiError> {
    let id = parse_id(&id)?;
    let Json(change) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(appointments::update_appointment_status(&conn, &id, change.status)?))
}
