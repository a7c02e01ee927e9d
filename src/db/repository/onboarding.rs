use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_opt_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

const ONBOARDING_COLUMNS: &str =
    "id, owner_email, current_step, draft, status, lab_id, created_at, updated_at";

fn read_onboarding(row: &Row<'_>) -> Result<LabOnboarding, DatabaseError> {
    let draft_json: String = row.get(3)?;
    Ok(LabOnboarding {
        id: parse_uuid("lab_onboardings", &row.get::<_, String>(0)?)?,
        owner_email: row.get(1)?,
        current_step: OnboardingStep::from_str(&row.get::<_, String>(2)?)?,
        draft: serde_json::from_str(&draft_json).map_err(|e| DatabaseError::CorruptRow {
            table: "lab_onboardings",
            reason: format!("bad draft: {e}"),
        })?,
        status: OnboardingStatus::from_str(&row.get::<_, String>(4)?)?,
        lab_id: parse_opt_uuid("lab_onboardings", row.get(5)?)?,
        created_at: parse_datetime("lab_onboardings", &row.get::<_, String>(6)?)?,
        updated_at: parse_datetime("lab_onboardings", &row.get::<_, String>(7)?)?,
    })
}

fn draft_json(draft: &OnboardingDraft) -> Result<String, DatabaseError> {
    serde_json::to_string(draft).map_err(|e| DatabaseError::CorruptRow {
        table: "lab_onboardings",
        reason: format!("draft not serializable: {e}"),
    })
}

pub fn insert_onboarding(conn: &Connection, onboarding: &LabOnboarding) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO lab_onboardings ({ONBOARDING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            onboarding.id.to_string(),
            onboarding.owner_email,
            onboarding.current_step.as_str(),
            draft_json(&onboarding.draft)?,
            onboarding.status.as_str(),
            onboarding.lab_id.map(|id| id.to_string()),
            format_datetime(&onboarding.created_at),
            format_datetime(&onboarding.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_onboarding(conn: &Connection, id: &Uuid) -> Result<Option<LabOnboarding>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ONBOARDING_COLUMNS} FROM lab_onboardings WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![id.to_string()])?;
    rows.next()?.map(read_onboarding).transpose()
}

/// Persist step, draft, status and lab link.
pub fn update_onboarding(conn: &Connection, onboarding: &LabOnboarding) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE lab_onboardings SET current_step = ?2, draft = ?3, status = ?4, lab_id = ?5,
         updated_at = ?6
         WHERE id = ?1",
        params![
            onboarding.id.to_string(),
            onboarding.current_step.as_str(),
            draft_json(&onboarding.draft)?,
            onboarding.status.as_str(),
            onboarding.lab_id.map(|id| id.to_string()),
            format_datetime(&onboarding.updated_at),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("LabOnboarding", onboarding.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::now;
    use crate::db::sqlite::open_memory_database;

    fn make_onboarding() -> LabOnboarding {
        let now = now();
        LabOnboarding {
            id: Uuid::new_v4(),
            owner_email: "owner@example.com".into(),
            current_step: OnboardingStep::LabDetails,
            draft: OnboardingDraft::default(),
            status: OnboardingStatus::InProgress,
            lab_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn draft_persists_as_json() {
        let conn = open_memory_database().unwrap();
        let mut onboarding = make_onboarding();
        insert_onboarding(&conn, &onboarding).unwrap();

        onboarding.draft.lab_details = Some(LabDetailsStep {
            name: "Apollo Diagnostics".into(),
            phone: "+919876543210".into(),
            email: "lab@example.com".into(),
            description: None,
        });
        onboarding.current_step = OnboardingStep::Location;
        update_onboarding(&conn, &onboarding).unwrap();

        let stored = get_onboarding(&conn, &onboarding.id).unwrap().unwrap();
        assert_eq!(stored.current_step, OnboardingStep::Location);
        assert_eq!(stored.draft, onboarding.draft);
        assert_eq!(stored.status, OnboardingStatus::InProgress);
    }

    #[test]
    fn update_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = update_onboarding(&conn, &make_onboarding()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
