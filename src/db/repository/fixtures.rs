//! Test fixtures: entity builders and direct inserts that bypass validation.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use super::*;
use crate::models::*;

pub(crate) fn now() -> NaiveDateTime {
    crate::db::now_utc()
}

pub(crate) fn in_days(days: i64) -> NaiveDateTime {
    now() + Duration::days(days)
}

pub(crate) fn make_lab(name: &str, city: &str, status: LabStatus) -> Lab {
    let now = now();
    Lab {
        id: Uuid::new_v4(),
        name: name.into(),
        address: "12 Main Road".into(),
        city: city.into(),
        pincode: Some("500081".into()),
        phone: "+919876543210".into(),
        email: "lab@example.com".into(),
        owner_email: Some("owner@example.com".into()),
        description: None,
        opening_hours: Some("7am-9pm".into()),
        accreditation: Some("NABL".into()),
        home_collection: true,
        rating: 4.2,
        status,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn make_test(lab_id: Uuid, name: &str, price: f64) -> LabTest {
    let now = now();
    LabTest {
        id: Uuid::new_v4(),
        lab_id,
        name: name.into(),
        category: TestCategory::Blood,
        description: None,
        price,
        turnaround_hours: 24,
        fasting_required: false,
        preparation: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn make_doctor(name: &str, email: &str) -> Doctor {
    let now = now();
    Doctor {
        id: Uuid::new_v4(),
        name: name.into(),
        email: email.into(),
        phone: None,
        specialization: "Cardiology".into(),
        qualification: Some("MBBS, MD".into()),
        experience_years: 12,
        consultation_fee: 800.0,
        hospital: Some("City Hospital".into()),
        city: Some("Hyderabad".into()),
        bio: None,
        available: true,
        rating: 4.5,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn seed_lab(conn: &Connection, name: &str, status: LabStatus) -> Lab {
    let lab = make_lab(name, "Hyderabad", status);
    insert_lab(conn, &lab).unwrap();
    lab
}

pub(crate) fn seed_test(conn: &Connection, lab: &Lab, name: &str, price: f64) -> LabTest {
    let test = make_test(lab.id, name, price);
    insert_lab_test(conn, &test).unwrap();
    test
}

pub(crate) fn seed_doctor(conn: &Connection, name: &str, email: &str) -> Doctor {
    let doctor = make_doctor(name, email);
    insert_doctor(conn, &doctor).unwrap();
    doctor
}

pub(crate) fn seed_booking(
    conn: &Connection,
    test: &LabTest,
    status: BookingStatus,
    scheduled_at: NaiveDateTime,
) -> TestBooking {
    let now = now();
    let booking = TestBooking {
        id: Uuid::new_v4(),
        test_id: test.id,
        lab_id: test.lab_id,
        patient_name: "Asha Rao".into(),
        patient_email: "asha@example.com".into(),
        patient_phone: "9876543210".into(),
        scheduled_at,
        collection_type: CollectionType::LabVisit,
        address: None,
        price: test.price,
        status,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    insert_booking(conn, &booking).unwrap();
    booking
}

pub(crate) fn seed_appointment(
    conn: &Connection,
    doctor: &Doctor,
    status: AppointmentStatus,
    scheduled_at: NaiveDateTime,
) -> Appointment {
    let now = now();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        patient_name: "Ravi Kumar".into(),
        patient_email: "ravi@example.com".into(),
        patient_phone: "9876500000".into(),
        scheduled_at,
        mode: ConsultationMode::InPerson,
        reason: Some("Chest pain follow-up".into()),
        fee: doctor.consultation_fee,
        status,
        created_at: now,
        updated_at: now,
    };
    insert_appointment(conn, &appointment).unwrap();
    appointment
}
