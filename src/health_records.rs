//! Patient health records. Patients are identified by an opaque external id.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, now_utc};
use crate::error::{OrNotFound, ServiceResult};
use crate::models::*;
use crate::validation::{self as v, ValidationError};

#[derive(Debug, Clone, Deserialize)]
pub struct HealthRecordInput {
    pub patient_id: String,
    pub record_type: RecordType,
    pub title: String,
    pub description: Option<String>,
    pub record_date: NaiveDate,
    pub doctor_id: Option<Uuid>,
    pub lab_id: Option<Uuid>,
    pub file_url: Option<String>,
}

pub fn create_record(conn: &Connection, input: HealthRecordInput) -> ServiceResult<HealthRecord> {
    let record = HealthRecord {
        id: Uuid::new_v4(),
        patient_id: v::clean(&input.patient_id),
        record_type: input.record_type,
        title: v::clean(&input.title),
        description: v::clean_opt(input.description.as_deref()),
        record_date: input.record_date,
        doctor_id: input.doctor_id,
        lab_id: input.lab_id,
        file_url: v::clean_opt(input.file_url.as_deref()),
        created_at: now_utc(),
    };

    v::required("patient_id", &record.patient_id)?;
    v::required("title", &record.title)?;
    v::max_len("title", &record.title, 200)?;
    v::not_in_future("record_date", &record.record_date)?;
    v::optional(record.file_url.as_deref(), |u| v::url("file_url", u))?;
    if let Some(doctor_id) = &record.doctor_id {
        if db::get_doctor(conn, doctor_id)?.is_none() {
            return Err(ValidationError::new("doctor_id", "does not reference an existing doctor").into());
        }
    }
    if let Some(lab_id) = &record.lab_id {
        if db::get_lab(conn, lab_id)?.is_none() {
            return Err(ValidationError::new("lab_id", "does not reference an existing lab").into());
        }
    }

    db::insert_health_record(conn, &record)?;
    tracing::info!(record_id = %record.id, record_type = %record.record_type, "Health record created");
    Ok(record)
}

pub fn get_record(conn: &Connection, id: &Uuid) -> ServiceResult<HealthRecord> {
    db::get_health_record(conn, id).or_not_found("HealthRecord")
}

pub fn list_records(conn: &Connection, filter: &HealthRecordFilter) -> ServiceResult<Vec<HealthRecord>> {
    v::required("patient_id", &filter.patient_id)?;
    Ok(db::list_health_records(conn, filter)?)
}

pub fn delete_record(conn: &Connection, id: &Uuid) -> ServiceResult<()> {
    get_record(conn, id)?;
    db::delete_health_record(conn, id)?;
    Ok(())
}
