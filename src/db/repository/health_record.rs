use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{
    format_datetime, param_refs, parse_date, parse_datetime, parse_opt_uuid, parse_uuid,
    FilterQuery,
};
use crate::db::DatabaseError;
use crate::models::*;

const RECORD_COLUMNS: &str = "id, patient_id, record_type, title, description, record_date,
     doctor_id, lab_id, file_url, created_at";

fn read_record(row: &Row<'_>) -> Result<HealthRecord, DatabaseError> {
    Ok(HealthRecord {
        id: parse_uuid("health_records", &row.get::<_, String>(0)?)?,
        patient_id: row.get(1)?,
        record_type: RecordType::from_str(&row.get::<_, String>(2)?)?,
        title: row.get(3)?,
        description: row.get(4)?,
        record_date: parse_date("health_records", &row.get::<_, String>(5)?)?,
        doctor_id: parse_opt_uuid("health_records", row.get(6)?)?,
        lab_id: parse_opt_uuid("health_records", row.get(7)?)?,
        file_url: row.get(8)?,
        created_at: parse_datetime("health_records", &row.get::<_, String>(9)?)?,
    })
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn insert_health_record(conn: &Connection, record: &HealthRecord) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO health_records ({RECORD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            record.id.to_string(),
            record.patient_id,
            record.record_type.as_str(),
            record.title,
            record.description,
            format_date(&record.record_date),
            record.doctor_id.map(|id| id.to_string()),
            record.lab_id.map(|id| id.to_string()),
            record.file_url,
            format_datetime(&record.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_health_record(conn: &Connection, id: &Uuid) -> Result<Option<HealthRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM health_records WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_record).transpose()
}

/// Newest first by record date.
pub fn list_health_records(
    conn: &Connection,
    filter: &HealthRecordFilter,
) -> Result<Vec<HealthRecord>, DatabaseError> {
    let mut query = FilterQuery::new(&format!(
        "SELECT {RECORD_COLUMNS} FROM health_records WHERE 1=1"
    ));
    query
        .and("patient_id = {}", filter.patient_id.clone())
        .and_opt("record_type = {}", filter.record_type.map(|t| t.as_str()));
    let (sql, values) = query.finish("record_date DESC, created_at DESC", filter.page);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(param_refs(&values).as_slice())?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(read_record(row)?);
    }
    Ok(records)
}

pub fn delete_health_record(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM health_records WHERE id = ?1",
        params![id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("HealthRecord", id));
    }
    Ok(())
}

pub fn count_health_records(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM health_records", [], |row| row.get(0))?)
}
