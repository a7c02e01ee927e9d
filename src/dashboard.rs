//! Lab-owner dashboard: catalogue size, booking pipeline and revenue for one lab.

use std::collections::BTreeMap;

use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{count_grouped, parse_uuid};
use crate::db::{self, now_utc, DatabaseError};
use crate::error::{OrNotFound, ServiceResult};
use crate::models::*;

const UPCOMING_LIMIT: u32 = 10;
const POPULAR_LIMIT: u32 = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LabDashboard {
    pub lab: Lab,
    pub test_count: i64,
    pub active_test_count: i64,
    /// Every booking status, zero when unused.
    pub bookings_by_status: BTreeMap<String, i64>,
    /// Completed bookings.
    pub total_revenue: f64,
    /// Confirmed and sample-collected bookings.
    pub pending_revenue: f64,
    pub upcoming: Vec<TestBooking>,
    pub popular_tests: Vec<PopularTest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularTest {
    pub test_id: Uuid,
    pub name: String,
    pub bookings: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn revenue(conn: &Connection, lab_id: &Uuid, statuses: &[BookingStatus]) -> Result<f64, DatabaseError> {
    let placeholders = statuses
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let total = conn.query_row(
        &format!(
            "SELECT COALESCE(SUM(price), 0.0) FROM test_bookings
             WHERE lab_id = ?1 AND status IN ({placeholders})"
        ),
        params![lab_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(total)
}

fn popular_tests(conn: &Connection, lab_id: &Uuid) -> Result<Vec<PopularTest>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, COUNT(b.id) AS n
         FROM lab_tests t
         JOIN test_bookings b ON b.test_id = t.id AND b.status != 'cancelled'
         WHERE t.lab_id = ?1
         GROUP BY t.id, t.name
         ORDER BY n DESC, t.name ASC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![lab_id.to_string(), POPULAR_LIMIT], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
    })?;

    let mut tests = Vec::new();
    for row in rows {
        let (id, name, bookings) = row?;
        tests.push(PopularTest {
            test_id: parse_uuid("lab_tests", &id)?,
            name,
            bookings,
        });
    }
    Ok(tests)
}

pub fn lab_dashboard(conn: &Connection, lab_id: &Uuid) -> ServiceResult<LabDashboard> {
    let lab = db::get_lab(conn, lab_id).or_not_found("Lab")?;
    let bookings_by_status = count_grouped(
        conn,
        "SELECT status, COUNT(*) FROM test_bookings WHERE lab_id = ?1 GROUP BY status",
        params![lab_id.to_string()],
        BookingStatus::ALL.iter().map(|s| s.as_str()),
    )?;

    Ok(LabDashboard {
        test_count: db::count_lab_tests(conn, lab_id, false)?,
        active_test_count: db::count_lab_tests(conn, lab_id, true)?,
        bookings_by_status,
        total_revenue: revenue(conn, lab_id, &[BookingStatus::Completed])?,
        pending_revenue: revenue(
            conn,
            lab_id,
            &[BookingStatus::Confirmed, BookingStatus::SampleCollected],
        )?,
        upcoming: db::list_upcoming_bookings(conn, lab_id, &now_utc(), UPCOMING_LIMIT)?,
        popular_tests: popular_tests(conn, lab_id)?,
        lab,
    })
}
