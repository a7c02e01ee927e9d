use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{format_datetime, like_pattern, param_refs, parse_datetime, parse_uuid, FilterQuery};
use crate::db::DatabaseError;
use crate::models::*;

const TEST_COLUMNS: &str = "id, lab_id, name, category, description, price, turnaround_hours,
     fasting_required, preparation, is_active, created_at, updated_at";

fn read_lab_test(row: &Row<'_>) -> Result<LabTest, DatabaseError> {
    Ok(LabTest {
        id: parse_uuid("lab_tests", &row.get::<_, String>(0)?)?,
        lab_id: parse_uuid("lab_tests", &row.get::<_, String>(1)?)?,
        name: row.get(2)?,
        category: TestCategory::from_str(&row.get::<_, String>(3)?)?,
        description: row.get(4)?,
        price: row.get(5)?,
        turnaround_hours: row.get(6)?,
        fasting_required: row.get::<_, i32>(7)? != 0,
        preparation: row.get(8)?,
        is_active: row.get::<_, i32>(9)? != 0,
        created_at: parse_datetime("lab_tests", &row.get::<_, String>(10)?)?,
        updated_at: parse_datetime("lab_tests", &row.get::<_, String>(11)?)?,
    })
}

pub fn insert_lab_test(conn: &Connection, test: &LabTest) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO lab_tests ({TEST_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            test.id.to_string(),
            test.lab_id.to_string(),
            test.name,
            test.category.as_str(),
            test.description,
            test.price,
            test.turnaround_hours,
            test.fasting_required as i32,
            test.preparation,
            test.is_active as i32,
            format_datetime(&test.created_at),
            format_datetime(&test.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_lab_test(conn: &Connection, id: &Uuid) -> Result<Option<LabTest>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {TEST_COLUMNS} FROM lab_tests WHERE id = ?1"))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_lab_test).transpose()
}

pub fn list_lab_tests(
    conn: &Connection,
    filter: &LabTestFilter,
) -> Result<Vec<LabTest>, DatabaseError> {
    let mut query =
        FilterQuery::new(&format!("SELECT {TEST_COLUMNS} FROM lab_tests WHERE 1=1"));
    query
        .and_opt("lab_id = {}", filter.lab_id.map(|id| id.to_string()))
        .and_opt("category = {}", filter.category.map(|c| c.as_str()))
        .and_opt(
            "name LIKE {} ESCAPE '\\'",
            filter.search.as_deref().map(like_pattern),
        )
        .and_opt("price <= {}", filter.max_price);
    if filter.active_only {
        query.and("is_active = {}", 1);
    }
    let (sql, values) = query.finish("price ASC, name ASC", filter.page);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(param_refs(&values).as_slice())?;
    let mut tests = Vec::new();
    while let Some(row) = rows.next()? {
        tests.push(read_lab_test(row)?);
    }
    Ok(tests)
}

pub fn update_lab_test(conn: &Connection, test: &LabTest) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE lab_tests SET name = ?2, category = ?3, description = ?4, price = ?5,
         turnaround_hours = ?6, fasting_required = ?7, preparation = ?8, is_active = ?9,
         updated_at = ?10
         WHERE id = ?1",
        params![
            test.id.to_string(),
            test.name,
            test.category.as_str(),
            test.description,
            test.price,
            test.turnaround_hours,
            test.fasting_required as i32,
            test.preparation,
            test.is_active as i32,
            format_datetime(&test.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("LabTest", test.id));
    }
    Ok(())
}

pub fn delete_lab_test(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM lab_tests WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("LabTest", id));
    }
    Ok(())
}

pub fn count_lab_tests(conn: &Connection, lab_id: &Uuid, active_only: bool) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM lab_tests WHERE lab_id = ?1 AND (?2 = 0 OR is_active = 1)",
        params![lab_id.to_string(), active_only as i32],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::repository::{delete_lab, get_lab};
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_filter_by_lab_and_price() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let other = seed_lab(&conn, "Vijaya Labs", LabStatus::Approved);
        seed_test(&conn, &lab, "CBC", 350.0);
        seed_test(&conn, &lab, "Lipid Profile", 900.0);
        seed_test(&conn, &other, "CBC", 300.0);

        let apollo = list_lab_tests(&conn, &LabTestFilter {
            lab_id: Some(lab.id),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(apollo.len(), 2);
        assert_eq!(apollo[0].name, "CBC");

        let cheap = list_lab_tests(&conn, &LabTestFilter {
            max_price: Some(400.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cheap.len(), 2);
        assert!(cheap.iter().all(|t| t.price <= 400.0));
    }

    #[test]
    fn test_name_unique_within_lab_only() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        seed_test(&conn, &lab, "CBC", 350.0);
        let err = insert_lab_test(&conn, &make_test(lab.id, "cbc", 400.0)).unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate(_)));
    }

    #[test]
    fn unknown_lab_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        let err = insert_lab_test(&conn, &make_test(Uuid::new_v4(), "CBC", 350.0)).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)), "got {err:?}");
    }

    #[test]
    fn active_only_hides_inactive_tests() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let mut retired = seed_test(&conn, &lab, "Old Panel", 100.0);
        seed_test(&conn, &lab, "CBC", 350.0);
        retired.is_active = false;
        update_lab_test(&conn, &retired).unwrap();

        let active = list_lab_tests(&conn, &LabTestFilter {
            lab_id: Some(lab.id),
            active_only: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(count_lab_tests(&conn, &lab.id, false).unwrap(), 2);
        assert_eq!(count_lab_tests(&conn, &lab.id, true).unwrap(), 1);
    }

    #[test]
    fn deleting_lab_cascades_to_tests() {
        let conn = open_memory_database().unwrap();
        let lab = seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let test = seed_test(&conn, &lab, "CBC", 350.0);
        delete_lab(&conn, &lab.id).unwrap();
        assert!(get_lab(&conn, &lab.id).unwrap().is_none());
        assert!(get_lab_test(&conn, &test.id).unwrap().is_none());
    }
}
