use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{format_datetime, param_refs, parse_datetime, parse_uuid, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const BOOKING_COLUMNS: &str = "id, test_id, lab_id, patient_name, patient_email, patient_phone,
     scheduled_at, collection_type, address, price, status, notes, created_at, updated_at";

fn read_booking(row: &Row<'_>) -> Result<TestBooking, DatabaseError> {
    Ok(TestBooking {
        id: parse_uuid("test_bookings", &row.get::<_, String>(0)?)?,
        test_id: parse_uuid("test_bookings", &row.get::<_, String>(1)?)?,
        lab_id: parse_uuid("test_bookings", &row.get::<_, String>(2)?)?,
        patient_name: row.get(3)?,
        patient_email: row.get(4)?,
        patient_phone: row.get(5)?,
        scheduled_at: parse_datetime("test_bookings", &row.get::<_, String>(6)?)?,
        collection_type: CollectionType::from_str(&row.get::<_, String>(7)?)?,
        address: row.get(8)?,
        price: row.get(9)?,
        status: BookingStatus::from_str(&row.get::<_, String>(10)?)?,
        notes: row.get(11)?,
        created_at: parse_datetime("test_bookings", &row.get::<_, String>(12)?)?,
        updated_at: parse_datetime("test_bookings", &row.get::<_, String>(13)?)?,
    })
}

pub fn insert_booking(conn: &Connection, booking: &TestBooking) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO test_bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        params![
            booking.id.to_string(),
            booking.test_id.to_string(),
            booking.lab_id.to_string(),
            booking.patient_name,
            booking.patient_email,
            booking.patient_phone,
            format_datetime(&booking.scheduled_at),
            booking.collection_type.as_str(),
            booking.address,
            booking.price,
            booking.status.as_str(),
            booking.notes,
            format_datetime(&booking.created_at),
            format_datetime(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &Uuid) -> Result<Option<TestBooking>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM test_bookings WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_booking).transpose()
}

/// Soonest appointment slot first.
pub fn list_bookings(
    conn: &Connection,
    filter: &BookingFilter,
) -> Result<Vec<TestBooking>, DatabaseError> {
    let mut query = FilterQuery::new(&format!(
        "SELECT {BOOKING_COLUMNS} FROM test_bookings WHERE 1=1"
    ));
    query
        .and_opt("lab_id = {}", filter.lab_id.map(|id| id.to_string()))
        .and_opt(
            "patient_email = {} COLLATE NOCASE",
            filter.patient_email.as_deref().map(|e| e.trim().to_string()),
        )
        .and_opt("status = {}", filter.status.map(|s| s.as_str()));
    let (sql, values) = query.finish("scheduled_at ASC, created_at ASC", filter.page);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(param_refs(&values).as_slice())?;
    let mut bookings = Vec::new();
    while let Some(row) = rows.next()? {
        bookings.push(read_booking(row)?);
    }
    Ok(bookings)
}

/// Pending or confirmed bookings of a lab scheduled at or after `from`, soonest first.
pub fn list_upcoming_bookings(
    conn: &Connection,
    lab_id: &Uuid,
    from: &NaiveDateTime,
    limit: u32,
) -> Result<Vec<TestBooking>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM test_bookings
         WHERE lab_id = ?1 AND status IN ('pending', 'confirmed') AND scheduled_at >= ?2
         ORDER BY scheduled_at ASC
         LIMIT ?3"
    ))?;
    let mut rows = stmt.query(params![lab_id.to_string(), format_datetime(from), limit])?;
    let mut bookings = Vec::new();
    while let Some(row) = rows.next()? {
        bookings.push(read_booking(row)?);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &Uuid,
    status: BookingStatus,
    updated_at: &NaiveDateTime,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE test_bookings SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), status.as_str(), format_datetime(updated_at)],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("TestBooking", id));
    }
    Ok(())
}

pub fn count_bookings_for_test(conn: &Connection, test_id: &Uuid) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM test_bookings WHERE test_id = ?1",
        params![test_id.to_string()],
        |row| row.get(0),
    )?)
}

pub fn count_bookings_for_lab(conn: &Connection, lab_id: &Uuid) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM test_bookings WHERE lab_id = ?1",
        params![lab_id.to_string()],
        |row| row.get(0),
    )?)
}
