//! Platform-wide analytics for administrators.

use std::collections::BTreeMap;

use chrono::Duration;
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{count_grouped, format_datetime, parse_uuid};
use crate::db::{self, now_utc, DatabaseError};
use crate::error::ServiceResult;
use crate::models::*;

const TOP_LABS_LIMIT: u32 = 5;
const TREND_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct PlatformAnalytics {
    pub labs_by_status: BTreeMap<String, i64>,
    pub total_tests: i64,
    pub active_tests: i64,
    pub total_doctors: i64,
    pub available_doctors: i64,
    pub published_posts: i64,
    pub health_records: i64,
    pub bookings_by_status: BTreeMap<String, i64>,
    pub appointments_by_status: BTreeMap<String, i64>,
    pub booking_revenue: f64,
    pub consultation_revenue: f64,
    pub top_labs: Vec<TopLab>,
    pub bookings_last_30_days: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopLab {
    pub lab_id: Uuid,
    pub name: String,
    pub bookings: i64,
    /// Completed bookings only.
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub bookings: i64,
}

fn scalar<T: rusqlite::types::FromSql>(conn: &Connection, sql: &str) -> Result<T, DatabaseError> {
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

fn top_labs(conn: &Connection) -> Result<Vec<TopLab>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.name, COUNT(b.id) AS n,
                COALESCE(SUM(CASE WHEN b.status = 'completed' THEN b.price ELSE 0.0 END), 0.0)
         FROM labs l
         JOIN test_bookings b ON b.lab_id = l.id
         GROUP BY l.id, l.name
         ORDER BY n DESC, l.name ASC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![TOP_LABS_LIMIT], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, f64>(3)?,
        ))
    })?;

    let mut labs = Vec::new();
    for row in rows {
        let (id, name, bookings, revenue) = row?;
        labs.push(TopLab {
            lab_id: parse_uuid("labs", &id)?,
            name,
            bookings,
            revenue,
        });
    }
    Ok(labs)
}

/// Bookings created per day over the trailing window, for days with bookings.
fn booking_trend(conn: &Connection) -> Result<Vec<DailyCount>, DatabaseError> {
    let since = now_utc() - Duration::days(TREND_DAYS);
    let mut stmt = conn.prepare(
        "SELECT substr(created_at, 1, 10) AS day, COUNT(*)
         FROM test_bookings
         WHERE created_at >= ?1
         GROUP BY day
         ORDER BY day ASC",
    )?;
    let rows = stmt.query_map(params![format_datetime(&since)], |row| {
        Ok(DailyCount {
            date: row.get(0)?,
            bookings: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn platform_analytics(conn: &Connection) -> ServiceResult<PlatformAnalytics> {
    let labs_by_status = count_grouped(
        conn,
        "SELECT status, COUNT(*) FROM labs GROUP BY status",
        [],
        LabStatus::ALL.iter().map(|s| s.as_str()),
    )?;
    let bookings_by_status = count_grouped(
        conn,
        "SELECT status, COUNT(*) FROM test_bookings GROUP BY status",
        [],
        BookingStatus::ALL.iter().map(|s| s.as_str()),
    )?;
    let appointments_by_status = count_grouped(
        conn,
        "SELECT status, COUNT(*) FROM appointments GROUP BY status",
        [],
        AppointmentStatus::ALL.iter().map(|s| s.as_str()),
    )?;

    Ok(PlatformAnalytics {
        labs_by_status,
        total_tests: scalar(conn, "SELECT COUNT(*) FROM lab_tests")?,
        active_tests: scalar(conn, "SELECT COUNT(*) FROM lab_tests WHERE is_active = 1")?,
        total_doctors: scalar(conn, "SELECT COUNT(*) FROM doctors")?,
        available_doctors: scalar(conn, "SELECT COUNT(*) FROM doctors WHERE available = 1")?,
        published_posts: scalar(
            conn,
            "SELECT COUNT(*) FROM blog_posts WHERE status = 'published'",
        )?,
        health_records: db::count_health_records(conn)?,
        bookings_by_status,
        appointments_by_status,
        booking_revenue: scalar(
            conn,
            "SELECT COALESCE(SUM(price), 0.0) FROM test_bookings WHERE status = 'completed'",
        )?,
        consultation_revenue: scalar(
            conn,
            "SELECT COALESCE(SUM(fee), 0.0) FROM appointments WHERE status = 'completed'",
        )?,
        top_labs: top_labs(conn)?,
        bookings_last_30_days: booking_trend(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn totals_match_seeded_data() {
        let conn = open_memory_database().unwrap();
        let apollo = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let vijaya = seed_lab(&conn, "Vijaya Labs", LabStatus::Approved);
        seed_lab(&conn, "Metro Labs", LabStatus::Pending);
        let cbc = seed_test(&conn, &apollo, "CBC", 300.0);
        let thyroid = seed_test(&conn, &vijaya, "Thyroid Panel", 700.0);
        let mut retired = seed_test(&conn, &vijaya, "Old Panel", 50.0);
        retired.is_active = false;
        db::update_lab_test(&conn, &retired).unwrap();

        seed_booking(&conn, &cbc, BookingStatus::Completed, in_days(-1));
        seed_booking(&conn, &cbc, BookingStatus::Pending, in_days(1));
        seed_booking(&conn, &cbc, BookingStatus::Cancelled, in_days(1));
        seed_booking(&conn, &thyroid, BookingStatus::Completed, in_days(-2));

        let meera = seed_doctor(&conn, "Dr. Meera Iyer", "meera@example.com");
        let mut away = make_doctor("Dr. Arjun Shah", "arjun@example.com");
        away.available = false;
        db::insert_doctor(&conn, &away).unwrap();
        seed_appointment(&conn, &meera, AppointmentStatus::Completed, in_days(-1));
        seed_appointment(&conn, &meera, AppointmentStatus::Scheduled, in_days(1));

        let stats = platform_analytics(&conn).unwrap();
        assert_eq!(stats.labs_by_status["approved"], 2);
        assert_eq!(stats.labs_by_status["pending"], 1);
        assert_eq!(stats.labs_by_status["rejected"], 0);
        assert_eq!(stats.total_tests, 3);
        assert_eq!(stats.active_tests, 2);
        assert_eq!(stats.total_doctors, 2);
        assert_eq!(stats.available_doctors, 1);
        assert_eq!(stats.published_posts, 0);
        assert_eq!(stats.bookings_by_status["completed"], 2);
        assert_eq!(stats.appointments_by_status["scheduled"], 1);
        assert_eq!(stats.appointments_by_status["no_show"], 0);
        assert_eq!(stats.booking_revenue, 1000.0);
        assert_eq!(stats.consultation_revenue, meera.consultation_fee);

        assert_eq!(stats.top_labs.len(), 2);
        assert_eq!(stats.top_labs[0].lab_id, apollo.id);
        assert_eq!(stats.top_labs[0].bookings, 3);
        assert_eq!(stats.top_labs[0].revenue, 300.0);
        assert_eq!(stats.top_labs[1].revenue, 700.0);

        // All fixture bookings were created today.
        assert_eq!(stats.bookings_last_30_days.len(), 1);
        assert_eq!(stats.bookings_last_30_days[0].bookings, 4);
        assert_eq!(
            stats.bookings_last_30_days[0].date,
            now_utc().format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn empty_platform() {
        let conn = open_memory_database().unwrap();
        let stats = platform_analytics(&conn).unwrap();
        assert_eq!(stats.booking_revenue, 0.0);
        assert!(stats.top_labs.is_empty());
        assert!(stats.bookings_last_30_days.is_empty());
        assert_eq!(stats.bookings_by_status.len(), BookingStatus::ALL.len());
    }
}
