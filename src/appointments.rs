//! Doctor appointments. One live appointment per doctor per slot.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, now_utc};
use crate::error::{OrNotFound, ServiceError, ServiceResult};
use crate::models::timestamp;
use crate::models::*;
use crate::validation::{self as v, ValidationError};

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentInput {
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub mode: ConsultationMode,
    pub reason: Option<String>,
}

pub fn create_appointment(conn: &Connection, input: AppointmentInput) -> ServiceResult<Appointment> {
    let patient_name = v::clean(&input.patient_name);
    let patient_email = v::clean(&input.patient_email);
    let patient_phone = v::clean(&input.patient_phone);
    let reason = v::clean_opt(input.reason.as_deref());

    v::required("patient_name", &patient_name)?;
    v::email("patient_email", &patient_email)?;
    v::phone("patient_phone", &patient_phone)?;
    let scheduled_at = timestamp::truncate(input.scheduled_at);
    v::in_future("scheduled_at", &scheduled_at)?;
    v::optional(reason.as_deref(), |r| v::max_len("reason", r, 1000))?;

    let doctor = db::get_doctor(conn, &input.doctor_id)?
        .ok_or_else(|| ValidationError::new("doctor_id", "does not reference an existing doctor"))?;
    if !doctor.available {
        return Err(ServiceError::conflict("Doctor is not accepting appointments"));
    }
    if db::slot_taken(conn, &doctor.id, &scheduled_at)? {
        return Err(ServiceError::conflict("Doctor already has an appointment at this time"));
    }

    let now = now_utc();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        patient_name,
        patient_email,
        patient_phone,
        scheduled_at,
        mode: input.mode,
        reason,
        fee: doctor.consultation_fee,
        status: AppointmentStatus::Scheduled,
        created_at: now,
        updated_at: now,
    };
    db::insert_appointment(conn, &appointment)?;
    tracing::info!(appointment_id = %appointment.id, doctor_id = %doctor.id, "Appointment scheduled");
    Ok(appointment)
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> ServiceResult<Appointment> {
    db::get_appointment(conn, id).or_not_found("Appointment")
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> ServiceResult<Vec<Appointment>> {
    Ok(db::list_appointments(conn, filter)?)
}

/// Only `scheduled` appointments move; completed, cancelled and no-show are final.
pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    next: AppointmentStatus,
) -> ServiceResult<Appointment> {
    let mut appointment = get_appointment(conn, id)?;
    if !appointment.status.can_transition_to(next) {
        return Err(ServiceError::conflict(format!(
            "Cannot change appointment status from {} to {next}",
            appointment.status
        )));
    }
    appointment.status = next;
    appointment.updated_at = now_utc();
    db::update_appointment_status(conn, id, next, &appointment.updated_at)?;
    tracing::info!(appointment_id = %id, status = %next, "Appointment status changed");
    Ok(appointment)
}
