//! Error type shared by the domain modules (labs, bookings, onboarding, ...).

use crate::db::DatabaseError;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Request is well-formed but conflicts with current state
    /// (invalid status transition, taken slot, dependent records).
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Turn a missing row into `ServiceError::NotFound`.
pub trait OrNotFound<T> {
    fn or_not_found(self, entity: &'static str) -> ServiceResult<T>;
}

impl<T> OrNotFound<T> for Result<Option<T>, DatabaseError> {
    fn or_not_found(self, entity: &'static str) -> ServiceResult<T> {
        self?.ok_or(ServiceError::NotFound { entity })
    }
}
