//! API error types with structured JSON responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::error::ServiceError;
use crate::validation::ValidationError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationError),
    #[error("Duplicate: {0}")]
    Duplicate(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                err.to_string(),
            ),
            ApiError::Duplicate(detail) => (StatusCode::BAD_REQUEST, "DUPLICATE", detail.clone()),
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::Validation(e),
            ServiceError::NotFound { entity } => ApiError::NotFound(format!("{entity} not found")),
            ServiceError::Conflict(message) => ApiError::BadRequest(message),
            ServiceError::Database(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Duplicate(_) => {
                ApiError::Duplicate("A record with the same unique value already exists".into())
            }
            DatabaseError::ConstraintViolation(detail) => ApiError::Duplicate(detail),
            DatabaseError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{entity_type} not found"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Parse a path id, rejecting anything that is not a UUID with 400.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn validation_names_the_field() {
        let err: ApiError = ServiceError::from(ValidationError::new("name", "is required")).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(json["error"]["message"], "name: is required");
    }

    #[tokio::test]
    async fn service_not_found_returns_404() {
        let err: ApiError = ServiceError::NotFound { entity: "Lab" }.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["message"], "Lab not found");
    }

    #[tokio::test]
    async fn conflict_returns_400() {
        let err: ApiError = ServiceError::conflict("Cannot change booking status").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn duplicate_and_constraint_return_400() {
        for db_err in [
            DatabaseError::Duplicate("UNIQUE constraint failed: labs.name".into()),
            DatabaseError::ConstraintViolation("referenced record does not exist".into()),
        ] {
            let response = ApiError::from(ServiceError::Database(db_err)).into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"]["code"], "DUPLICATE");
        }
    }

    #[tokio::test]
    async fn internal_returns_500_and_hides_detail() {
        let err: ApiError = DatabaseError::MigrationFailed {
            version: 2,
            reason: "disk full".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INTERNAL");
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn io_failure_is_internal_not_duplicate() {
        let err: ApiError = DatabaseError::Io {
            path: "/var/lib/ekitsa".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INTERNAL");
        assert!(!json.to_string().contains("/var/lib/ekitsa"));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(parse_id("not-a-uuid"), Err(ApiError::BadRequest(_))));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
