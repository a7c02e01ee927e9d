use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{LabStatus, TestCategory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lab {
    pub id: Uuid,
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
    pub home_collection: bool,
    pub rating: f64,
    pub status: LabStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A diagnostic test offered by a lab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTest {
    pub id: Uuid,
    pub lab_id: Uuid,
    pub name: String,
    pub category: TestCategory,
    pub description: Option<String>,
    pub price: f64,
    pub turnaround_hours: u32,
    pub fasting_required: bool,
    pub preparation: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
