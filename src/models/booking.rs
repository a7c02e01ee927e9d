use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BookingStatus, CollectionType};

/// A patient's reservation of a lab test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestBooking {
    pub id: Uuid,
    pub test_id: Uuid,
    pub lab_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub scheduled_at: NaiveDateTime,
    pub collection_type: CollectionType,
    pub address: Option<String>,
    /// Test price at the time of booking.
    pub price: f64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
