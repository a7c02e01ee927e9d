//! Doctor directory.

use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, now_utc};
use crate::error::{OrNotFound, ServiceError, ServiceResult};
use crate::models::*;
use crate::validation::{self as v, Validated};

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub consultation_fee: f64,
    pub hospital: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub available: Option<bool>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    pub experience_years: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub hospital: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub available: Option<bool>,
    pub rating: Option<f64>,
}

fn validate_doctor(doctor: &Doctor) -> Validated<()> {
    v::required("name", &doctor.name)?;
    v::max_len("name", &doctor.name, 120)?;
    v::email("email", &doctor.email)?;
    v::optional(doctor.phone.as_deref(), |p| v::phone("phone", p))?;
    v::required("specialization", &doctor.specialization)?;
    v::range_u32("experience_years", doctor.experience_years, 0, 70)?;
    v::non_negative("consultation_fee", doctor.consultation_fee)?;
    v::optional(doctor.bio.as_deref(), |b| v::max_len("bio", b, 2000))?;
    v::range_f64("rating", doctor.rating, 0.0, 5.0)?;
    Ok(())
}

pub fn create_doctor(conn: &Connection, input: DoctorInput) -> ServiceResult<Doctor> {
    let now = now_utc();
    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: v::clean(&input.name),
        email: v::clean(&input.email),
        phone: v::clean_opt(input.phone.as_deref()),
        specialization: v::clean(&input.specialization),
        qualification: v::clean_opt(input.qualification.as_deref()),
        experience_years: input.experience_years,
        consultation_fee: input.consultation_fee,
        hospital: v::clean_opt(input.hospital.as_deref()),
        city: v::clean_opt(input.city.as_deref()),
        bio: v::clean_opt(input.bio.as_deref()),
        available: input.available.unwrap_or(true),
        rating: input.rating.unwrap_or(0.0),
        created_at: now,
        updated_at: now,
    };
    validate_doctor(&doctor)?;
    db::insert_doctor(conn, &doctor)?;
    tracing::info!(doctor_id = %doctor.id, "Doctor created");
    Ok(doctor)
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> ServiceResult<Doctor> {
    db::get_doctor(conn, id).or_not_found("Doctor")
}

pub fn list_doctors(conn: &Connection, filter: &DoctorFilter) -> ServiceResult<Vec<Doctor>> {
    Ok(db::list_doctors(conn, filter)?)
}

pub fn update_doctor(conn: &Connection, id: &Uuid, patch: DoctorPatch) -> ServiceResult<Doctor> {
    let mut doctor = get_doctor(conn, id)?;

    if let Some(name) = patch.name {
        doctor.name = v::clean(&name);
    }
    if let Some(email) = patch.email {
        doctor.email = v::clean(&email);
    }
    if let Some(specialization) = patch.specialization {
        doctor.specialization = v::clean(&specialization);
    }
    for (target, value) in [
        (&mut doctor.phone, patch.phone),
        (&mut doctor.qualification, patch.qualification),
        (&mut doctor.hospital, patch.hospital),
        (&mut doctor.city, patch.city),
        (&mut doctor.bio, patch.bio),
    ] {
        if let Some(value) = value {
            *target = v::clean_opt(Some(&value));
        }
    }
    if let Some(years) = patch.experience_years {
        doctor.experience_years = years;
    }
    if let Some(fee) = patch.consultation_fee {
        doctor.consultation_fee = fee;
    }
    if let Some(available) = patch.available {
        doctor.available = available;
    }
    if let Some(rating) = patch.rating {
        doctor.rating = rating;
    }

    validate_doctor(&doctor)?;
    doctor.updated_at = now_utc();
    db::update_doctor(conn, &doctor)?;
    Ok(doctor)
}

/// Doctors with appointment history are kept; mark them unavailable instead.
pub fn delete_doctor(conn: &Connection, id: &Uuid) -> ServiceResult<()> {
    get_doctor(conn, id)?;
    if db::count_appointments_for_doctor(conn, id)? > 0 {
        return Err(ServiceError::conflict(
            "Doctor has appointments and cannot be deleted",
        ));
    }
    db::delete_doctor(conn, id)?;
    tracing::info!(doctor_id = %id, "Doctor deleted");
    Ok(())
}
