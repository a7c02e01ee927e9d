use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{OnboardingStatus, OnboardingStep, TestCategory};

/// A lab owner's in-progress registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabOnboarding {
    pub id: Uuid,
    pub owner_email: String,
    pub current_step: OnboardingStep,
    pub draft: OnboardingDraft,
    pub status: OnboardingStatus,
    pub lab_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Step payloads saved so far. Stored as a JSON column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub lab_details: Option<LabDetailsStep>,
    pub location: Option<LocationStep>,
    pub services: Option<ServicesStep>,
    pub tests: Option<TestsStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabDetailsStep {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStep {
    pub address: String,
    pub city: String,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesStep {
    #[serde(default)]
    pub home_collection: bool,
    pub opening_hours: Option<String>,
    pub accreditation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestsStep {
    pub tests: Vec<OnboardingTest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingTest {
    pub name: String,
    pub category: TestCategory,
    pub price: f64,
    pub turnaround_hours: Option<u32>,
    #[serde(default)]
    pub fasting_required: bool,
}
