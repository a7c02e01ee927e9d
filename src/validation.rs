//! Field-level input checks shared by every write path.
//!
//! Each check returns the first problem as a `ValidationError` naming the
//! offending field. Strings are trimmed by `clean` / `clean_opt` before
//! they are checked or stored.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid phone regex"));

static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("valid pincode regex"));

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Validated<T> = Result<T, ValidationError>;

/// Trim a string field.
pub fn clean(value: &str) -> String {
    value.trim().to_string()
}

/// Trim an optional string field, mapping blank to `None`.
pub fn clean_opt(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn required(field: &str, value: &str) -> Validated<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

pub fn max_len(field: &str, value: &str, max: usize) -> Validated<()> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn len_between(field: &str, value: &str, min: usize, max: usize) -> Validated<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {min} and {max} characters"),
        ));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> Validated<()> {
    required(field, value)?;
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(ValidationError::new(field, "must be a valid email address"));
    }
    Ok(())
}

/// Phone numbers: 7 to 15 digits, optional leading `+`; spaces and dashes ignored.
pub fn phone(field: &str, value: &str) -> Validated<()> {
    required(field, value)?;
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if !PHONE_RE.is_match(&compact) {
        return Err(ValidationError::new(field, "must be a valid phone number"));
    }
    Ok(())
}

pub fn pincode(field: &str, value: &str) -> Validated<()> {
    if !PINCODE_RE.is_match(value.trim()) {
        return Err(ValidationError::new(field, "must be a 6-digit pincode"));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: f64) -> Validated<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(field, "must be zero or greater"));
    }
    Ok(())
}

pub fn range_f64(field: &str, value: f64, min: f64, max: f64) -> Validated<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(())
}

pub fn range_u32(field: &str, value: u32, min: u32, max: u32) -> Validated<()> {
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(())
}

pub fn url(field: &str, value: &str) -> Validated<()> {
    let v = value.trim();
    if !(v.starts_with("http://") || v.starts_with("https://")) || v.len() < 10 {
        return Err(ValidationError::new(field, "must be an http(s) URL"));
    }
    Ok(())
}

pub fn in_future(field: &str, value: &NaiveDateTime) -> Validated<()> {
    if *value <= Utc::now().naive_utc() {
        return Err(ValidationError::new(field, "must be in the future"));
    }
    Ok(())
}

pub fn not_in_future(field: &str, value: &NaiveDate) -> Validated<()> {
    if *value > Utc::now().date_naive() {
        return Err(ValidationError::new(field, "cannot be in the future"));
    }
    Ok(())
}

/// Apply a check to an optional field.
pub fn optional<T: ?Sized>(
    value: Option<&T>,
    check: impl FnOnce(&T) -> Validated<()>,
) -> Validated<()> {
    match value {
        Some(v) => check(v),
        None => Ok(()),
    }
}
