use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{format_datetime, param_refs, parse_datetime, parse_uuid, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, doctor_id, patient_name, patient_email, patient_phone,
     scheduled_at, mode, reason, fee, status, created_at, updated_at";

fn read_appointment(row: &Row<'_>) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: parse_uuid("appointments", &row.get::<_, String>(0)?)?,
        doctor_id: parse_uuid("appointments", &row.get::<_, String>(1)?)?,
        patient_name: row.get(2)?,
        patient_email: row.get(3)?,
        patient_phone: row.get(4)?,
        scheduled_at: parse_datetime("appointments", &row.get::<_, String>(5)?)?,
        mode: ConsultationMode::from_str(&row.get::<_, String>(6)?)?,
        reason: row.get(7)?,
        fee: row.get(8)?,
        status: AppointmentStatus::from_str(&row.get::<_, String>(9)?)?,
        created_at: parse_datetime("appointments", &row.get::<_, String>(10)?)?,
        updated_at: parse_datetime("appointments", &row.get::<_, String>(11)?)?,
    })
}

pub fn insert_appointment(conn: &Connection, appointment: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            appointment.id.to_string(),
            appointment.doctor_id.to_string(),
            appointment.patient_name,
            appointment.patient_email,
            appointment.patient_phone,
            format_datetime(&appointment.scheduled_at),
            appointment.mode.as_str(),
            appointment.reason,
            appointment.fee,
            appointment.status.as_str(),
            format_datetime(&appointment.created_at),
            format_datetime(&appointment.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_appointment).transpose()
}

pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut query = FilterQuery::new(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE 1=1"
    ));
    query
        .and_opt("doctor_id = {}", filter.doctor_id.map(|id| id.to_string()))
        .and_opt(
            "patient_email = {} COLLATE NOCASE",
            filter.patient_email.as_deref().map(|e| e.trim().to_string()),
        )
        .and_opt("status = {}", filter.status.map(|s| s.as_str()));
    let (sql, values) = query.finish("scheduled_at ASC, created_at ASC", filter.page);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(param_refs(&values).as_slice())?;
    let mut appointments = Vec::new();
    while let Some(row) = rows.next()? {
        appointments.push(read_appointment(row)?);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
    updated_at: &NaiveDateTime,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), status.as_str(), format_datetime(updated_at)],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Appointment", id));
    }
    Ok(())
}

/// Whether the doctor already holds a non-cancelled appointment at `scheduled_at`.
pub fn slot_taken(
    conn: &Connection,
    doctor_id: &Uuid,
    scheduled_at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND scheduled_at = ?2 AND status != 'cancelled'",
        params![doctor_id.to_string(), format_datetime(scheduled_at)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn count_appointments_for_doctor(conn: &Connection, doctor_id: &Uuid) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE doctor_id = ?1",
        params![doctor_id.to_string()],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn slot_taken_ignores_cancelled() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Meera Iyer", "meera@example.com");
        let slot = in_days(2);
        let first = seed_appointment(&conn, &doctor, AppointmentStatus::Scheduled, slot);
        assert!(slot_taken(&conn, &doctor.id, &slot).unwrap());

        update_appointment_status(&conn, &first.id, AppointmentStatus::Cancelled, &now()).unwrap();
        assert!(!slot_taken(&conn, &doctor.id, &slot).unwrap());

        // The freed slot can be rebooked.
        seed_appointment(&conn, &doctor, AppointmentStatus::Scheduled, slot);
        assert_eq!(count_appointments_for_doctor(&conn, &doctor.id).unwrap(), 2);
    }

    #[test]
    fn unique_index_backs_up_slot_check() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Meera Iyer", "meera@example.com");
        let slot = in_days(2);
        let first = seed_appointment(&conn, &doctor, AppointmentStatus::Scheduled, slot);
        let mut second = first.clone();
        second.id = Uuid::new_v4();
        let err = insert_appointment(&conn, &second).unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate(_)));
    }

    #[test]
    fn list_by_doctor_and_status() {
        let conn = open_memory_database().unwrap();
        let meera = seed_doctor(&conn, "Dr. Meera Iyer", "meera@example.com");
        let arjun = seed_doctor(&conn, "Dr. Arjun Shah", "arjun@example.com");
        seed_appointment(&conn, &meera, AppointmentStatus::Scheduled, in_days(1));
        seed_appointment(&conn, &meera, AppointmentStatus::Completed, in_days(2));
        seed_appointment(&conn, &arjun, AppointmentStatus::Scheduled, in_days(1));

        let scheduled = list_appointments(&conn, &AppointmentFilter {
            doctor_id: Some(meera.id),
            status: Some(AppointmentStatus::Scheduled),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(scheduled.len(), 1);

        let by_patient = list_appointments(&conn, &AppointmentFilter {
            patient_email: Some("ravi@example.com".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(by_patient.len(), 3);
    }
}
