//! Lab test bookings: creation against an approved lab's active test, and
//! the status workflow `pending → confirmed → sample_collected → completed`.

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
pub struct BookingInput {
    pub test_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub collection_type: CollectionType,
    pub address: Option<String>,
    pub notes: Option<String>,
}

pub fn create_booking(conn: &Connection, input: BookingInput) -> ServiceResult<TestBooking> {
    let patient_name = v::clean(&input.patient_name);
    let patient_email = v::clean(&input.patient_email);
    let patient_phone = v::clean(&input.patient_phone);
    let address = v::clean_opt(input.address.as_deref());
    let notes = v::clean_opt(input.notes.as_deref());

    v::required("patient_name", &patient_name)?;
    v::email("patient_email", &patient_email)?;
    v::phone("patient_phone", &patient_phone)?;
    let scheduled_at = timestamp::truncate(input.scheduled_at);
    v::in_future("scheduled_at", &scheduled_at)?;
    v::optional(notes.as_deref(), |n| v::max_len("notes", n, 1000))?;

    let test = db::get_lab_test(conn, &input.test_id)?
        .ok_or_else(|| ValidationError::new("test_id", "does not reference an existing test"))?;
    if !test.is_active {
        return Err(ValidationError::new("test_id", "test is not currently offered").into());
    }
    let lab = db::get_lab(conn, &test.lab_id).or_not_found("Lab")?;
    if lab.status != LabStatus::Approved {
        return Err(ServiceError::conflict("Lab is not accepting bookings"));
    }
    if input.collection_type == CollectionType::HomeCollection {
        if !lab.home_collection {
            return Err(ValidationError::new(
                "collection_type",
                "lab does not offer home collection",
            )
            .into());
        }
        if address.is_none() {
            return Err(ValidationError::new("address", "is required for home collection").into());
        }
    }

    let now = now_utc();
    let booking = TestBooking {
        id: Uuid::new_v4(),
        test_id: test.id,
        lab_id: lab.id,
        patient_name,
        patient_email,
        patient_phone,
        scheduled_at,
        collection_type: input.collection_type,
        address,
        price: test.price,
        status: BookingStatus::Pending,
        notes,
        created_at: now,
        updated_at: now,
    };
    db::insert_booking(conn, &booking)?;
    tracing::info!(
        booking_id = %booking.id,
        lab_id = %booking.lab_id,
        test_id = %booking.test_id,
        "Test booked"
    );
    Ok(booking)
}

pub fn get_booking(conn: &Connection, id: &Uuid) -> ServiceResult<TestBooking> {
    db::get_booking(conn, id).or_not_found("Booking")
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> ServiceResult<Vec<TestBooking>> {
    Ok(db::list_bookings(conn, filter)?)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &Uuid,
    next: BookingStatus,
) -> ServiceResult<TestBooking> {
    let mut booking = get_booking(conn, id)?;
    if !booking.status.can_transition_to(next) {
        return Err(ServiceError::conflict(format!(
            "Cannot change booking status from {} to {next}",
            booking.status
        )));
    }
    let previous = booking.status;
    booking.status = next;
    booking.updated_at = now_utc();
    db::update_booking_status(conn, id, next, &booking.updated_at)?;
    tracing::info!(booking_id = %id, from = %previous, to = %next, "Booking status changed");
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    fn input(test_id: Uuid) -> BookingInput {
        BookingInput {
            test_id,
            patient_name: "Asha Rao".into(),
            patient_email: "asha@example.com".into(),
            patient_phone: "98765 43210".into(),
            scheduled_at: in_days(2),
            collection_type: CollectionType::LabVisit,
            address: None,
            notes: None,
        }
    }

    #[test]
    fn booking_snapshots_price() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let mut test = seed_test(&conn, &lab, "CBC", 350.0);
        let booking = create_booking(&conn, input(test.id)).unwrap();
        assert_eq!(booking.price, 350.0);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.lab_id, lab.id);

        test.price = 500.0;
        db::update_lab_test(&conn, &test).unwrap();
        assert_eq!(get_booking(&conn, &booking.id).unwrap().price, 350.0);
    }

    #[test]
    fn created_booking_matches_stored_row() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let test = seed_test(&conn, &lab, "CBC", 350.0);
        let mut req = input(test.id);
        req.scheduled_at += chrono::Duration::milliseconds(750);

        let created = create_booking(&conn, req).unwrap();
        assert_eq!(created.scheduled_at.and_utc().timestamp_subsec_nanos(), 0);
        assert_eq!(get_booking(&conn, &created.id).unwrap().scheduled_at, created.scheduled_at);
    }

    #[test]
    fn unapproved_lab_refuses_bookings() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Pending);
        let test = seed_test(&conn, &lab, "CBC", 350.0);
        assert!(matches!(create_booking(&conn, input(test.id)), Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn past_slot_and_unknown_test_rejected() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let test = seed_test(&conn, &lab, "CBC", 350.0);

        let mut past = input(test.id);
        past.scheduled_at = in_days(-1);
        assert!(matches!(create_booking(&conn, past), Err(ServiceError::Validation(_))));
        assert!(matches!(
            create_booking(&conn, input(Uuid::new_v4())),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn home_collection_needs_support_and_address() {
        let conn = open_memory_database().unwrap();
        let mut lab = make_lab("Walk-in Only Labs", "Pune", LabStatus::Approved);
        lab.home_collection = false;
        db::insert_lab(&conn, &lab).unwrap();
        let walk_in_test = seed_test(&conn, &lab, "CBC", 350.0);
        let mut home = input(walk_in_test.id);
        home.collection_type = CollectionType::HomeCollection;
        home.address = Some("4 Lake View".into());
        match create_booking(&conn, home) {
            Err(ServiceError::Validation(e)) => assert_eq!(e.field, "collection_type"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let home_lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let test = seed_test(&conn, &home_lab, "CBC", 350.0);
        let mut no_address = input(test.id);
        no_address.collection_type = CollectionType::HomeCollection;
        match create_booking(&conn, no_address) {
            Err(ServiceError::Validation(e)) => assert_eq!(e.field, "address"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn status_workflow_enforced() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let test = seed_test(&conn, &lab, "CBC", 350.0);
        let booking = create_booking(&conn, input(test.id)).unwrap();

        assert!(matches!(
            update_booking_status(&conn, &booking.id, BookingStatus::Completed),
            Err(ServiceError::Conflict(_))
        ));
        for next in [
            BookingStatus::Confirmed,
            BookingStatus::SampleCollected,
            BookingStatus::Completed,
        ] {
            assert_eq!(update_booking_status(&conn, &booking.id, next).unwrap().status, next);
        }
        assert!(matches!(
            update_booking_status(&conn, &booking.id, BookingStatus::Cancelled),
            Err(ServiceError::Conflict(_))
        ));
    }
}
