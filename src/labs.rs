//! Lab directory and test catalogue: input validation and lifecycle rules
//! on top of the repository layer.

use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, now_utc};
use crate::error::{OrNotFound, ServiceError, ServiceResult};
use crate::models::*;
use crate::validation::{self as v, Validated, ValidationError};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LabInput {
    pub name: String,
    pub address: String,
    pub city: String,
    pub pincode: Option<String>,
    pub phone: String,
    pub email: String,
    pub owner_email: Option<String>,
    pub description: Option<String>,
    pub opening_hours: Option<String>,
    pub accreditation: Option<String>,
    #[serde(default)]
    pub home_collection: bool,
    pub rating: Option<f64>,
}

/// Partial update. Blank optional text clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_email: Option<String>,
    pub description: Option<String>,
    pub opening_hours: Option<String>,
    pub accreditation: Option<String>,
    pub home_collection: Option<bool>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabTestInput {
    pub lab_id: Uuid,
    pub name: String,
    pub category: TestCategory,
    pub description: Option<String>,
    pub price: f64,
    pub turnaround_hours: Option<u32>,
    #[serde(default)]
    pub fasting_required: bool,
    pub preparation: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabTestPatch {
    pub name: Option<String>,
    pub category: Option<TestCategory>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub turnaround_hours: Option<u32>,
    pub fasting_required: Option<bool>,
    pub preparation: Option<String>,
    pub is_active: Option<bool>,
}

pub const DEFAULT_TURNAROUND_HOURS: u32 = 24;
pub const MAX_TEST_PRICE: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub(crate) fn validate_lab(lab: &Lab) -> Validated<()> {
    v::required("name", &lab.name)?;
    v::len_between("name", &lab.name, 2, 120)?;
    v::required("address", &lab.address)?;
    v::required("city", &lab.city)?;
    v::optional(lab.pincode.as_deref(), |p| v::pincode("pincode", p))?;
    v::phone("phone", &lab.phone)?;
    v::email("email", &lab.email)?;
    v::optional(lab.owner_email.as_deref(), |e| v::email("owner_email", e))?;
    v::optional(lab.description.as_deref(), |d| v::max_len("description", d, 2000))?;
    v::range_f64("rating", lab.rating, 0.0, 5.0)?;
    Ok(())
}

pub(crate) fn validate_lab_test(test: &LabTest) -> Validated<()> {
    v::required("name", &test.name)?;
    v::max_len("name", &test.name, 120)?;
    v::non_negative("price", test.price)?;
    v::range_f64("price", test.price, 0.0, MAX_TEST_PRICE)?;
    v::range_u32("turnaround_hours", test.turnaround_hours, 1, 720)?;
    v::optional(test.description.as_deref(), |d| v::max_len("description", d, 2000))?;
    Ok(())
}

fn patch_text(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = v::clean(&value);
    }
}

fn patch_opt_text(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = v::clean_opt(Some(&value));
    }
}

// ---------------------------------------------------------------------------
// Labs
// ---------------------------------------------------------------------------

/// Register a lab. New labs start `pending` until an admin approves them.
pub fn create_lab(conn: &Connection, input: LabInput) -> ServiceResult<Lab> {
    let now = now_utc();
    let lab = Lab {
        id: Uuid::new_v4(),
        name: v::clean(&input.name),
        address: v::clean(&input.address),
        city: v::clean(&input.city),
        pincode: v::clean_opt(input.pincode.as_deref()),
        phone: v::clean(&input.phone),
        email: v::clean(&input.email),
        owner_email: v::clean_opt(input.owner_email.as_deref()),
        description: v::clean_opt(input.description.as_deref()),
        opening_hours: v::clean_opt(input.opening_hours.as_deref()),
        accreditation: v::clean_opt(input.accreditation.as_deref()),
        home_collection: input.home_collection,
        rating: input.rating.unwrap_or(0.0),
        status: LabStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    validate_lab(&lab)?;
    db::insert_lab(conn, &lab)?;
    tracing::info!(lab_id = %lab.id, name = %lab.name, "Lab created");
    Ok(lab)
}

pub fn get_lab(conn: &Connection, id: &Uuid) -> ServiceResult<Lab> {
    db::get_lab(conn, id).or_not_found("Lab")
}

pub fn list_labs(conn: &Connection, filter: &LabFilter) -> ServiceResult<Vec<Lab>> {
    Ok(db::list_labs(conn, filter)?)
}

pub fn update_lab(conn: &Connection, id: &Uuid, patch: LabPatch) -> ServiceResult<Lab> {
    let mut lab = get_lab(conn, id)?;
    patch_text(&mut lab.name, patch.name);
    patch_text(&mut lab.address, patch.address);
    patch_text(&mut lab.city, patch.city);
    patch_opt_text(&mut lab.pincode, patch.pincode);
    patch_text(&mut lab.phone, patch.phone);
    patch_text(&mut lab.email, patch.email);
    patch_opt_text(&mut lab.owner_email, patch.owner_email);
    patch_opt_text(&mut lab.description, patch.description);
    patch_opt_text(&mut lab.opening_hours, patch.opening_hours);
    patch_opt_text(&mut lab.accreditation, patch.accreditation);
    if let Some(home_collection) = patch.home_collection {
        lab.home_collection = home_collection;
    }
    if let Some(rating) = patch.rating {
        lab.rating = rating;
    }
    validate_lab(&lab)?;
    lab.updated_at = now_utc();
    db::update_lab(conn, &lab)?;
    Ok(lab)
}

/// Admin moderation: approve, reject or suspend.
pub fn set_lab_status(conn: &Connection, id: &Uuid, status: LabStatus) -> ServiceResult<Lab> {
    let mut lab = get_lab(conn, id)?;
    if lab.status == status {
        return Err(ServiceError::conflict(format!("Lab is already {status}")));
    }
    let previous = lab.status;
    lab.status = status;
    lab.updated_at = now_utc();
    db::update_lab(conn, &lab)?;
    tracing::info!(lab_id = %lab.id, from = %previous, to = %status, "Lab status changed");
    Ok(lab)
}

/// Delete a lab and its tests. Labs with bookings are kept.
pub fn delete_lab(conn: &Connection, id: &Uuid) -> ServiceResult<()> {
    get_lab(conn, id)?;
    if db::count_bookings_for_lab(conn, id)? > 0 {
        return Err(ServiceError::conflict("Lab has bookings and cannot be deleted"));
    }
    db::delete_lab(conn, id)?;
    tracing::info!(lab_id = %id, "Lab deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

pub fn create_lab_test(conn: &Connection, input: LabTestInput) -> ServiceResult<LabTest> {
    if db::get_lab(conn, &input.lab_id)?.is_none() {
        return Err(ValidationError::new("lab_id", "does not reference an existing lab").into());
    }
    let now = now_utc();
    let test = LabTest {
        id: Uuid::new_v4(),
        lab_id: input.lab_id,
        name: v::clean(&input.name),
        category: input.category,
        description: v::clean_opt(input.description.as_deref()),
        price: input.price,
        turnaround_hours: input.turnaround_hours.unwrap_or(DEFAULT_TURNAROUND_HOURS),
        fasting_required: input.fasting_required,
        preparation: v::clean_opt(input.preparation.as_deref()),
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    validate_lab_test(&test)?;
    db::insert_lab_test(conn, &test)?;
    Ok(test)
}

pub fn get_lab_test(conn: &Connection, id: &Uuid) -> ServiceResult<LabTest> {
    db::get_lab_test(conn, id).or_not_found("Test")
}

pub fn list_lab_tests(conn: &Connection, filter: &LabTestFilter) -> ServiceResult<Vec<LabTest>> {
    Ok(db::list_lab_tests(conn, filter)?)
}

/// Active tests of one lab, 404 when the lab does not exist.
pub fn tests_for_lab(conn: &Connection, lab_id: &Uuid, page: Page) -> ServiceResult<Vec<LabTest>> {
    get_lab(conn, lab_id)?;
    list_lab_tests(
        conn,
        &LabTestFilter {
            lab_id: Some(*lab_id),
            active_only: true,
            page,
            ..Default::default()
        },
    )
}

pub fn update_lab_test(conn: &Connection, id: &Uuid, patch: LabTestPatch) -> ServiceResult<LabTest> {
    let mut test = get_lab_test(conn, id)?;
    patch_text(&mut test.name, patch.name);
    if let Some(category) = patch.category {
        test.category = category;
    }
    patch_opt_text(&mut test.description, patch.description);
    if let Some(price) = patch.price {
        test.price = price;
    }
    if let Some(hours) = patch.turnaround_hours {
        test.turnaround_hours = hours;
    }
    if let Some(fasting) = patch.fasting_required {
        test.fasting_required = fasting;
    }
    patch_opt_text(&mut test.preparation, patch.preparation);
    if let Some(active) = patch.is_active {
        test.is_active = active;
    }
    validate_lab_test(&test)?;
    test.updated_at = now_utc();
    db::update_lab_test(conn, &test)?;
    Ok(test)
}

pub fn delete_lab_test(conn: &Connection, id: &Uuid) -> ServiceResult<()> {
    get_lab_test(conn, id)?;
    if db::count_bookings_for_test(conn, id)? > 0 {
        return Err(ServiceError::conflict(
            "Test has bookings and cannot be deleted; deactivate it instead",
        ));
    }
    db::delete_lab_test(conn, id)?;
    Ok(())
}
