use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RecordType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: Uuid,
    pub patient_id: String,
    pub record_type: RecordType,
    pub title: String,
    pub description: Option<String>,
    pub record_date: NaiveDate,
    pub doctor_id: Option<Uuid>,
    pub lab_id: Option<Uuid>,
    pub file_url: Option<String>,
    pub created_at: NaiveDateTime,
}
