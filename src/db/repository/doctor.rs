use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{format_datetime, like_pattern, param_refs, parse_datetime, parse_uuid, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str = "id, name, email, phone, specialization, qualification,
     experience_years, consultation_fee, hospital, city, bio, available, rating,
     created_at, updated_at";

fn read_doctor(row: &Row<'_>) -> Result<Doctor, DatabaseError> {
    Ok(Doctor {
        id: parse_uuid("doctors", &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        specialization: row.get(4)?,
        qualification: row.get(5)?,
        experience_years: row.get(6)?,
        consultation_fee: row.get(7)?,
        hospital: row.get(8)?,
        city: row.get(9)?,
        bio: row.get(10)?,
        available: row.get::<_, i32>(11)? != 0,
        rating: row.get(12)?,
        created_at: parse_datetime("doctors", &row.get::<_, String>(13)?)?,
        updated_at: parse_datetime("doctors", &row.get::<_, String>(14)?)?,
    })
}

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO doctors ({DOCTOR_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            doctor.id.to_string(),
            doctor.name,
            doctor.email,
            doctor.phone,
            doctor.specialization,
            doctor.qualification,
            doctor.experience_years,
            doctor.consultation_fee,
            doctor.hospital,
            doctor.city,
            doctor.bio,
            doctor.available as i32,
            doctor.rating,
            format_datetime(&doctor.created_at),
            format_datetime(&doctor.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_doctor).transpose()
}

pub fn list_doctors(conn: &Connection, filter: &DoctorFilter) -> Result<Vec<Doctor>, DatabaseError> {
    let mut query = FilterQuery::new(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE 1=1"));
    query
        .and_opt(
            "specialization = {} COLLATE NOCASE",
            filter.specialization.clone(),
        )
        .and_opt("city = {} COLLATE NOCASE", filter.city.clone())
        .and_opt("available = {}", filter.available.map(i32::from))
        .and_opt(
            "(name LIKE {} ESCAPE '\\' OR specialization LIKE {} ESCAPE '\\')",
            filter.search.as_deref().map(like_pattern),
        );
    let (sql, values) = query.finish("rating DESC, name ASC", filter.page);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(param_refs(&values).as_slice())?;
    let mut doctors = Vec::new();
    while let Some(row) = rows.next()? {
        doctors.push(read_doctor(row)?);
    }
    Ok(doctors)
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET name = ?2, email = ?3, phone = ?4, specialization = ?5,
         qualification = ?6, experience_years = ?7, consultation_fee = ?8, hospital = ?9,
         city = ?10, bio = ?11, available = ?12, rating = ?13, updated_at = ?14
         WHERE id = ?1",
        params![
            doctor.id.to_string(),
            doctor.name,
            doctor.email,
            doctor.phone,
            doctor.specialization,
            doctor.qualification,
            doctor.experience_years,
            doctor.consultation_fee,
            doctor.hospital,
            doctor.city,
            doctor.bio,
            doctor.available as i32,
            doctor.rating,
            format_datetime(&doctor.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Doctor", doctor.id));
    }
    Ok(())
}

pub fn delete_doctor(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Doctor", id));
    }
    Ok(())
}
