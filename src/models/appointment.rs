use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, ConsultationMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub scheduled_at: NaiveDateTime,
    pub mode: ConsultationMode,
    pub reason: Option<String>,
    /// Consultation fee at the time of booking.
    pub fee: f64,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
