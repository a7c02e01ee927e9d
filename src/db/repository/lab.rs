use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{format_datetime, like_pattern, param_refs, parse_datetime, parse_uuid, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const LAB_COLUMNS: &str = "id, name, address, city, pincode, phone, email, owner_email,
     description, opening_hours, accreditation, home_collection, rating, status,
     created_at, updated_at";

fn read_lab(row: &Row<'_>) -> Result<Lab, DatabaseError> {
    Ok(Lab {
        id: parse_uuid("labs", &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        pincode: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        owner_email: row.get(7)?,
        description: row.get(8)?,
        opening_hours: row.get(9)?,
        accreditation: row.get(10)?,
        home_collection: row.get::<_, i32>(11)? != 0,
        rating: row.get(12)?,
        status: LabStatus::from_str(&row.get::<_, String>(13)?)?,
        created_at: parse_datetime("labs", &row.get::<_, String>(14)?)?,
        updated_at: parse_datetime("labs", &row.get::<_, String>(15)?)?,
    })
}

pub fn insert_lab(conn: &Connection, lab: &Lab) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO labs ({LAB_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ),
        params![
            lab.id.to_string(),
            lab.name,
            lab.address,
            lab.city,
            lab.pincode,
            lab.phone,
            lab.email,
            lab.owner_email,
            lab.description,
            lab.opening_hours,
            lab.accreditation,
            lab.home_collection as i32,
            lab.rating,
            lab.status.as_str(),
            format_datetime(&lab.created_at),
            format_datetime(&lab.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_lab(conn: &Connection, id: &Uuid) -> Result<Option<Lab>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {LAB_COLUMNS} FROM labs WHERE id = ?1"))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_lab).transpose()
}

pub fn list_labs(conn: &Connection, filter: &LabFilter) -> Result<Vec<Lab>, DatabaseError> {
    let mut query = FilterQuery::new(&format!("SELECT {LAB_COLUMNS} FROM labs WHERE 1=1"));
    query
        .and_opt("city = {} COLLATE NOCASE", filter.city.clone())
        .and_opt(
            "name LIKE {} ESCAPE '\\'",
            filter.search.as_deref().map(like_pattern),
        )
        .and_opt("status = {}", filter.status.map(|s| s.as_str()))
        .and_opt("home_collection = {}", filter.home_collection.map(i32::from));
    let (sql, values) = query.finish("rating DESC, name ASC", filter.page);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(param_refs(&values).as_slice())?;
    let mut labs = Vec::new();
    while let Some(row) = rows.next()? {
        labs.push(read_lab(row)?);
    }
    Ok(labs)
}

/// Overwrite every mutable column of an existing lab.
pub fn update_lab(conn: &Connection, lab: &Lab) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE labs SET name = ?2, address = ?3, city = ?4, pincode = ?5, phone = ?6,
         email = ?7, owner_email = ?8, description = ?9, opening_hours = ?10,
         accreditation = ?11, home_collection = ?12, rating = ?13, status = ?14,
         updated_at = ?15
         WHERE id = ?1",
        params![
            lab.id.to_string(),
            lab.name,
            lab.address,
            lab.city,
            lab.pincode,
            lab.phone,
            lab.email,
            lab.owner_email,
            lab.description,
            lab.opening_hours,
            lab.accreditation,
            lab.home_collection as i32,
            lab.rating,
            lab.status.as_str(),
            format_datetime(&lab.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("Lab", lab.id));
    }
    Ok(())
}

pub fn delete_lab(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM labs WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("Lab", id));
    }
    Ok(())
}
