use uuid::Uuid;

use super::enums::{
    AppointmentStatus, BookingStatus, LabStatus, PostStatus, RecordType, TestCategory,
};

/// Default page size for list queries.
pub const DEFAULT_LIMIT: u32 = 20;
/// Upper bound on page size.
pub const MAX_LIMIT: u32 = 100;

/// Limit/offset pair, clamped to sane bounds.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Default)]
pub struct LabFilter {
    pub city: Option<String>,
    pub search: Option<String>,
    /// `None` lists every status.
    pub status: Option<LabStatus>,
    pub home_collection: Option<bool>,
    pub page: Page,
}

#[derive(Debug, Default)]
pub struct LabTestFilter {
    pub lab_id: Option<Uuid>,
    pub category: Option<TestCategory>,
    pub search: Option<String>,
    pub max_price: Option<f64>,
    pub active_only: bool,
    pub page: Page,
}

#[derive(Debug, Default)]
pub struct DoctorFilter {
    pub specialization: Option<String>,
    pub city: Option<String>,
    pub available: Option<bool>,
    pub search: Option<String>,
    pub page: Page,
}

#[derive(Debug, Default)]
pub struct BlogPostFilter {
    pub status: Option<PostStatus>,
    pub tag: Option<String>,
    pub page: Page,
}

#[derive(Debug, Default)]
pub struct HealthRecordFilter {
    pub patient_id: String,
    pub record_type: Option<RecordType>,
    pub page: Page,
}

#[derive(Debug, Default)]
pub struct BookingFilter {
    pub lab_id: Option<Uuid>,
    pub patient_email: Option<String>,
    pub status: Option<BookingStatus>,
    pub page: Page,
}

#[derive(Debug, Default)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub patient_email: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub page: Page,
}
