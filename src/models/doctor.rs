use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: Option<String>,
    pub experience_years: u32,
    pub consultation_fee: f64,
    pub hospital: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub available: bool,
    pub rating: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
