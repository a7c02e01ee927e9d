//! Lab-owner onboarding wizard.
//!
//! Steps run in a fixed order: lab details, location, services, tests,
//! review. Each saved step is validated in full and stored in the draft.
//! A step may only be saved once every earlier step is complete, and
//! saving the current step advances the wizard. Submitting from `review`
//! creates the lab (status `pending`) and its tests in one transaction.

use std::collections::HashSet;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, now_utc, DatabaseError};
use crate::error::{OrNotFound, ServiceError, ServiceResult};
use crate::labs::{validate_lab, validate_lab_test, DEFAULT_TURNAROUND_HOURS};
use crate::models::*;
use crate::validation::{self as v, Validated, ValidationError};

pub const MAX_ONBOARDING_TESTS: usize = 50;

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingSubmission {
    pub onboarding: LabOnboarding,
    pub lab: Lab,
    pub tests: Vec<LabTest>,
}

// ---------------------------------------------------------------------------
// Step payloads
// ---------------------------------------------------------------------------

fn parse_step<T: DeserializeOwned>(step: OnboardingStep, payload: serde_json::Value) -> Validated<T> {
    serde_json::from_value(payload)
        .map_err(|e| ValidationError::new(step.as_str(), format!("invalid payload: {e}")))
}

fn clean_lab_details(mut details: LabDetailsStep) -> Validated<LabDetailsStep> {
    details.name = v::clean(&details.name);
    details.phone = v::clean(&details.phone);
    details.email = v::clean(&details.email);
    details.description = v::clean_opt(details.description.as_deref());

    v::required("name", &details.name)?;
    v::len_between("name", &details.name, 2, 120)?;
    v::phone("phone", &details.phone)?;
    v::email("email", &details.email)?;
    v::optional(details.description.as_deref(), |d| v::max_len("description", d, 2000))?;
    Ok(details)
}

fn clean_location(mut location: LocationStep) -> Validated<LocationStep> {
    location.address = v::clean(&location.address);
    location.city = v::clean(&location.city);
    location.pincode = v::clean_opt(location.pincode.as_deref());

    v::required("address", &location.address)?;
    v::required("city", &location.city)?;
    v::optional(location.pincode.as_deref(), |p| v::pincode("pincode", p))?;
    Ok(location)
}

fn clean_services(mut services: ServicesStep) -> Validated<ServicesStep> {
    services.opening_hours = v::clean_opt(services.opening_hours.as_deref());
    services.accreditation = v::clean_opt(services.accreditation.as_deref());
    v::optional(services.opening_hours.as_deref(), |h| v::max_len("opening_hours", h, 200))?;
    v::optional(services.accreditation.as_deref(), |a| v::max_len("accreditation", a, 200))?;
    Ok(services)
}

fn clean_tests(mut step: TestsStep) -> Validated<TestsStep> {
    if step.tests.is_empty() || step.tests.len() > MAX_ONBOARDING_TESTS {
        return Err(ValidationError::new(
            "tests",
            format!("must list between 1 and {MAX_ONBOARDING_TESTS} tests"),
        ));
    }
    let mut seen = HashSet::new();
    for (i, test) in step.tests.iter_mut().enumerate() {
        test.name = v::clean(&test.name);
        let field = format!("tests[{i}]");
        if test.name.is_empty() {
            return Err(ValidationError::new(&field, "name is required"));
        }
        if !seen.insert(test.name.to_lowercase()) {
            return Err(ValidationError::new(
                &field,
                format!("duplicate test name {:?}", test.name),
            ));
        }
        // Same rules the submitted test will face.
        validate_lab_test(&lab_test_from_step(Uuid::nil(), test, now_utc()))
            .map_err(|e| ValidationError::new(&format!("{field}.{}", e.field), e.message))?;
    }
    Ok(step)
}

fn lab_test_from_step(lab_id: Uuid, test: &OnboardingTest, now: chrono::NaiveDateTime) -> LabTest {
    LabTest {
        id: Uuid::new_v4(),
        lab_id,
        name: test.name.clone(),
        category: test.category,
        description: None,
        price: test.price,
        turnaround_hours: test.turnaround_hours.unwrap_or(DEFAULT_TURNAROUND_HOURS),
        fasting_required: test.fasting_required,
        preparation: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn step_complete(draft: &OnboardingDraft, step: OnboardingStep) -> bool {
    match step {
        OnboardingStep::LabDetails => draft.lab_details.is_some(),
        OnboardingStep::Location => draft.location.is_some(),
        OnboardingStep::Services => draft.services.is_some(),
        OnboardingStep::Tests => draft.tests.is_some(),
        OnboardingStep::Review => false,
    }
}

// ---------------------------------------------------------------------------
// Wizard operations
// ---------------------------------------------------------------------------

pub fn start(conn: &Connection, owner_email: &str) -> ServiceResult<LabOnboarding> {
    let owner_email = v::clean(owner_email);
    v::email("owner_email", &owner_email)?;

    let now = now_utc();
    let onboarding = LabOnboarding {
        id: Uuid::new_v4(),
        owner_email,
        current_step: OnboardingStep::LabDetails,
        draft: OnboardingDraft::default(),
        status: OnboardingStatus::InProgress,
        lab_id: None,
        created_at: now,
        updated_at: now,
    };
    db::insert_onboarding(conn, &onboarding)?;
    tracing::info!(onboarding_id = %onboarding.id, "Lab onboarding started");
    Ok(onboarding)
}

pub fn get(conn: &Connection, id: &Uuid) -> ServiceResult<LabOnboarding> {
    db::get_onboarding(conn, id).or_not_found("Onboarding")
}

pub fn save_step(
    conn: &Connection,
    id: &Uuid,
    step: OnboardingStep,
    payload: serde_json::Value,
) -> ServiceResult<LabOnboarding> {
    let mut onboarding = get(conn, id)?;
    if onboarding.status == OnboardingStatus::Submitted {
        return Err(ServiceError::conflict("Onboarding has already been submitted"));
    }
    if let Some(missing) = OnboardingStep::ALL[..step.index()]
        .iter()
        .find(|s| !step_complete(&onboarding.draft, **s))
    {
        return Err(ServiceError::conflict(format!(
            "Step {missing} must be completed before {step}"
        )));
    }

    let draft = &mut onboarding.draft;
    match step {
        OnboardingStep::LabDetails => {
            draft.lab_details = Some(clean_lab_details(parse_step(step, payload)?)?);
        }
        OnboardingStep::Location => {
            draft.location = Some(clean_location(parse_step(step, payload)?)?);
        }
        OnboardingStep::Services => {
            draft.services = Some(clean_services(parse_step(step, payload)?)?);
        }
        OnboardingStep::Tests => {
            draft.tests = Some(clean_tests(parse_step(step, payload)?)?);
        }
        OnboardingStep::Review => {
            return Err(ServiceError::conflict(
                "Review has nothing to save; submit the onboarding instead",
            ));
        }
    }

    if step == onboarding.current_step {
        if let Some(next) = step.next() {
            onboarding.current_step = next;
        }
    }
    onboarding.updated_at = now_utc();
    db::update_onboarding(conn, &onboarding)?;
    tracing::debug!(onboarding_id = %id, step = %step, current = %onboarding.current_step, "Onboarding step saved");
    Ok(onboarding)
}

/// Create the lab and its tests from a completed draft.
pub fn submit(conn: &Connection, id: &Uuid) -> ServiceResult<OnboardingSubmission> {
    let mut onboarding = get(conn, id)?;
    if onboarding.status == OnboardingStatus::Submitted {
        return Err(ServiceError::conflict("Onboarding has already been submitted"));
    }
    if onboarding.current_step != OnboardingStep::Review {
        return Err(ServiceError::conflict(format!(
            "Onboarding is at step {}; complete every step before submitting",
            onboarding.current_step
        )));
    }
    let draft = &onboarding.draft;
    let (Some(details), Some(location), Some(services), Some(tests_step)) =
        (&draft.lab_details, &draft.location, &draft.services, &draft.tests)
    else {
        return Err(ServiceError::conflict("Onboarding draft is incomplete"));
    };

    let now = now_utc();
    let lab = Lab {
        id: Uuid::new_v4(),
        name: details.name.clone(),
        address: location.address.clone(),
        city: location.city.clone(),
        pincode: location.pincode.clone(),
        phone: details.phone.clone(),
        email: details.email.clone(),
        owner_email: Some(onboarding.owner_email.clone()),
        description: details.description.clone(),
        opening_hours: services.opening_hours.clone(),
        accreditation: services.accreditation.clone(),
        home_collection: services.home_collection,
        rating: 0.0,
        status: LabStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    validate_lab(&lab)?;
    let tests: Vec<LabTest> = tests_step
        .tests
        .iter()
        .map(|t| lab_test_from_step(lab.id, t, now))
        .collect();
    for test in &tests {
        validate_lab_test(test)?;
    }

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    db::insert_lab(&tx, &lab)?;
    for test in &tests {
        db::insert_lab_test(&tx, test)?;
    }
    onboarding.status = OnboardingStatus::Submitted;
    onboarding.lab_id = Some(lab.id);
    onboarding.updated_at = now;
    db::update_onboarding(&tx, &onboarding)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        onboarding_id = %onboarding.id,
        lab_id = %lab.id,
        tests = tests.len(),
        "Lab onboarding submitted"
    );
    Ok(OnboardingSubmission {
        onboarding,
        lab,
        tests,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::repository::fixtures::seed_lab;
    use crate::db::sqlite::open_memory_database;

    fn details(name: &str) -> serde_json::Value {
        json!({ "name": name, "phone": "+919876543210", "email": "lab@example.com" })
    }

    fn location() -> serde_json::Value {
        json!({ "address": "12 Main Road", "city": "Hyderabad", "pincode": "500081" })
    }

    fn services() -> serde_json::Value {
        json!({ "home_collection": true, "opening_hours": "7am-9pm" })
    }

    fn tests_payload() -> serde_json::Value {
        json!({ "tests": [
            { "name": "CBC", "category": "blood", "price": 350.0 },
            { "name": "Lipid Profile", "category": "blood", "price": 900.0,
              "turnaround_hours": 12, "fasting_required": true }
        ]})
    }

    fn completed(conn: &Connection, lab_name: &str) -> LabOnboarding {
        let o = start(conn, "owner@example.com").unwrap();
        save_step(conn, &o.id, OnboardingStep::LabDetails, details(lab_name)).unwrap();
        save_step(conn, &o.id, OnboardingStep::Location, location()).unwrap();
        save_step(conn, &o.id, OnboardingStep::Services, services()).unwrap();
        save_step(conn, &o.id, OnboardingStep::Tests, tests_payload()).unwrap()
    }

    #[test]
    fn steps_advance_in_order() {
        let conn = open_memory_database().unwrap();
        let o = start(&conn, "owner@example.com").unwrap();
        assert_eq!(o.current_step, OnboardingStep::LabDetails);

        let o = save_step(&conn, &o.id, OnboardingStep::LabDetails, details("Apollo")).unwrap();
        assert_eq!(o.current_step, OnboardingStep::Location);
        assert_eq!(o.draft.lab_details.as_ref().unwrap().name, "Apollo");

        let o = completed(&conn, "Vijaya Labs");
        assert_eq!(o.current_step, OnboardingStep::Review);
    }

    #[test]
    fn later_step_refused_before_earlier_ones() {
        let conn = open_memory_database().unwrap();
        let o = start(&conn, "owner@example.com").unwrap();
        assert!(matches!(
            save_step(&conn, &o.id, OnboardingStep::Services, services()),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn resaving_earlier_step_keeps_progress() {
        let conn = open_memory_database().unwrap();
        let o = start(&conn, "owner@example.com").unwrap();
        save_step(&conn, &o.id, OnboardingStep::LabDetails, details("Apollo")).unwrap();
        save_step(&conn, &o.id, OnboardingStep::Location, location()).unwrap();
        let o = save_step(&conn, &o.id, OnboardingStep::LabDetails, details("Apollo Labs")).unwrap();
        assert_eq!(o.current_step, OnboardingStep::Services);
        assert_eq!(o.draft.lab_details.unwrap().name, "Apollo Labs");
    }

    #[test]
    fn invalid_payloads_rejected() {
        let conn = open_memory_database().unwrap();
        let o = start(&conn, "owner@example.com").unwrap();
        assert!(matches!(
            save_step(&conn, &o.id, OnboardingStep::LabDetails, json!({ "name": "Apollo" })),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            save_step(&conn, &o.id, OnboardingStep::LabDetails, details("A")),
            Err(ServiceError::Validation(_))
        ));

        save_step(&conn, &o.id, OnboardingStep::LabDetails, details("Apollo")).unwrap();
        save_step(&conn, &o.id, OnboardingStep::Location, location()).unwrap();
        save_step(&conn, &o.id, OnboardingStep::Services, services()).unwrap();
        let dupes = json!({ "tests": [
            { "name": "CBC", "category": "blood", "price": 350.0 },
            { "name": "cbc ", "category": "blood", "price": 300.0 }
        ]});
        match save_step(&conn, &o.id, OnboardingStep::Tests, dupes) {
            Err(ServiceError::Validation(e)) => assert_eq!(e.field, "tests[1]"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(matches!(
            save_step(&conn, &o.id, OnboardingStep::Tests, json!({ "tests": [] })),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn tests_step_applies_catalog_rules() {
        let conn = open_memory_database().unwrap();
        let o = start(&conn, "owner@example.com").unwrap();
        save_step(&conn, &o.id, OnboardingStep::LabDetails, details("Apollo")).unwrap();
        save_step(&conn, &o.id, OnboardingStep::Location, location()).unwrap();
        save_step(&conn, &o.id, OnboardingStep::Services, services()).unwrap();

        let long_name = json!({ "tests": [
            { "name": "X".repeat(121), "category": "blood", "price": 350.0 }
        ]});
        match save_step(&conn, &o.id, OnboardingStep::Tests, long_name) {
            Err(ServiceError::Validation(e)) => {
                assert_eq!(e.field, "tests[0].name");
                assert_eq!(e.message, "must be at most 120 characters");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let slow = json!({ "tests": [
            { "name": "CBC", "category": "blood", "price": 350.0, "turnaround_hours": 721 }
        ]});
        match save_step(&conn, &o.id, OnboardingStep::Tests, slow) {
            Err(ServiceError::Validation(e)) => assert_eq!(e.field, "tests[0].turnaround_hours"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(get(&conn, &o.id).unwrap().current_step, OnboardingStep::Tests);

        let fits = json!({ "tests": [
            { "name": "X".repeat(120), "category": "blood", "price": 350.0 }
        ]});
        save_step(&conn, &o.id, OnboardingStep::Tests, fits).unwrap();
        submit(&conn, &o.id).unwrap();
    }

    #[test]
    fn submit_creates_pending_lab_with_tests() {
        let conn = open_memory_database().unwrap();
        let o = completed(&conn, "Apollo Diagnostics");
        let submission = submit(&conn, &o.id).unwrap();

        assert_eq!(submission.lab.status, LabStatus::Pending);
        assert_eq!(submission.lab.owner_email.as_deref(), Some("owner@example.com"));
        assert!(submission.lab.home_collection);
        assert_eq!(submission.tests.len(), 2);
        assert_eq!(submission.onboarding.status, OnboardingStatus::Submitted);
        assert_eq!(submission.onboarding.lab_id, Some(submission.lab.id));
        assert_eq!(db::count_lab_tests(&conn, &submission.lab.id, true).unwrap(), 2);

        assert!(matches!(submit(&conn, &o.id), Err(ServiceError::Conflict(_))));
        assert!(matches!(
            save_step(&conn, &o.id, OnboardingStep::Services, services()),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn submit_before_review_refused() {
        let conn = open_memory_database().unwrap();
        let o = start(&conn, "owner@example.com").unwrap();
        save_step(&conn, &o.id, OnboardingStep::LabDetails, details("Apollo")).unwrap();
        assert!(matches!(submit(&conn, &o.id), Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn name_collision_rolls_back_and_keeps_draft() {
        let conn = open_memory_database().unwrap();
        seed_lab(&conn, "Apollo Diagnostics", LabStatus::Approved);
        let o = completed(&conn, "apollo diagnostics");

        let err = submit(&conn, &o.id).unwrap_err();
        assert!(matches!(err, ServiceError::Database(DatabaseError::Duplicate(_))));
        let after = get(&conn, &o.id).unwrap();
        assert_eq!(after.status, OnboardingStatus::InProgress);
        assert_eq!(after.lab_id, None);
    }
}
