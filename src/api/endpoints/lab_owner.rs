//! Lab-owner endpoints: the onboarding wizard and the lab dashboard.
//!
//! - `POST /api/lab-owner/onboarding` — start a draft
//! - `GET /api/lab-owner/onboarding/:id`
//! - `PUT /api/lab-owner/onboarding/:id/steps/:step` — save one step
//! - `POST /api/lab-owner/onboarding/:id/submit` — create lab + tests
//! - `GET /api/lab-owner/labs/:id/dashboard`

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::{parse_id, ApiError};
use crate::api::types::ApiContext;
use crate::dashboard::{self, LabDashboard};
use crate::models::{LabOnboarding, OnboardingStep};
use crate::onboarding::{self, OnboardingSubmission};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub owner_email: String,
}

/// `POST /api/lab-owner/onboarding`
pub async fn start(
    State(ctx): State<ApiContext>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LabOnboarding>), ApiError> {
    let Json(request) = payload?;
    let conn = ctx.core.open_db()?;
    let draft = onboarding::start(&conn, &request.owner_email)?;
    Ok((StatusCode::CREATED, Json(draft)))
}

/// `GET /api/lab-owner/onboarding/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<LabOnboarding>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(onboarding::get(&conn, &id)?))
}

/// `PUT /api/lab-owner/onboarding/:id/steps/:step`
///
/// The body is the step payload; its shape depends on the step.
pub async fn save_step(
    State(ctx): State<ApiContext>,
    Path((id, step)): Path<(String, String)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<LabOnboarding>, ApiError> {
    let id = parse_id(&id)?;
    let step = OnboardingStep::from_str(step.trim())
        .map_err(|_| ApiError::BadRequest(format!("Unknown onboarding step: {step}")))?;
    let Json(body) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(onboarding::save_step(&conn, &id, step, body)?))
}

/// `POST /api/lab-owner/onboarding/:id/submit`
pub async fn submit(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<OnboardingSubmission>), ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    let submission = onboarding::submit(&conn, &id)?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// `GET /api/lab-owner/labs/:id/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<LabDashboard>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(dashboard::lab_dashboard(&conn, &id)?))
}
