//! HTTP error mapping
//!
//! Every domain error is rendered through [`STATUS_TABLE`], keyed by
//! [`ErrorKind`]. Kinds that map to a 5xx status never expose their message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use sightline_common::{Error, ErrorKind};

/// Kind → HTTP status lookup
pub const STATUS_TABLE: &[(ErrorKind, StatusCode)] = &[
    (ErrorKind::InvalidCoordinates, StatusCode::BAD_REQUEST),
    (ErrorKind::InvalidObservationTime, StatusCode::BAD_REQUEST),
    (ErrorKind::SightingTooClose, StatusCode::UNPROCESSABLE_ENTITY),
    (ErrorKind::AnimalNotFound, StatusCode::NOT_FOUND),
    (ErrorKind::NotFound, StatusCode::NOT_FOUND),
    (ErrorKind::InvalidInput, StatusCode::BAD_REQUEST),
    (ErrorKind::Conflict, StatusCode::CONFLICT),
    (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
];

/// Message shown to clients in place of internal details
pub const GENERIC_INTERNAL_MESSAGE: &str = "internal server error";

/// Look up the status for a kind; unknown kinds are treated as internal
pub fn status_for(kind: ErrorKind) -> StatusCode {
    STATUS_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, status)| *status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Domain or repository error
    #[error(transparent)]
    Domain(#[from] Error),

    /// Missing or malformed reporter identity (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed request outside the domain taxonomy (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Domain(err) => {
                let kind = err.kind();
                let status = status_for(kind);
                let message = if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed with internal error");
                    GENERIC_INTERNAL_MESSAGE.to_string()
                } else {
                    err.to_string()
                };
                (status, kind.code(), message)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_every_kind_has_a_status() {
        let kinds = [
            ErrorKind::InvalidCoordinates,
            ErrorKind::InvalidObservationTime,
            ErrorKind::SightingTooClose,
            ErrorKind::AnimalNotFound,
            ErrorKind::NotFound,
            ErrorKind::InvalidInput,
            ErrorKind::Conflict,
            ErrorKind::Internal,
        ];
        for kind in kinds {
            assert!(
                STATUS_TABLE.iter().any(|(k, _)| *k == kind),
                "{:?} missing from STATUS_TABLE",
                kind
            );
        }
    }

    #[test]
    fn test_validation_errors_are_client_errors() {
        assert_eq!(status_for(ErrorKind::InvalidCoordinates), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::SightingTooClose), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::AnimalNotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = ApiError::from(Error::internal("connection refused at 10.0.0.3")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        let response = ApiError::from(Error::internal("secret dsn")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], GENERIC_INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_not_found_body_carries_message() {
        let id = Uuid::new_v4();
        let response = ApiError::from(Error::AnimalNotFound(id)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "ANIMAL_NOT_FOUND");
        assert!(body["error"]["message"].as_str().unwrap().contains(&id.to_string()));
    }
}
