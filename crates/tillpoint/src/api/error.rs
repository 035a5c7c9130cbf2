//! Unified API error handling with enveloped responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::Envelope;
use crate::auth::AuthError;

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    /// Authentication/authorization failure; rendered by `AuthError` itself.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => err.status_code(),
        }
    }

    /// Categorize an anyhow error by its message.
    ///
    /// Patterns recognized:
    /// - "not found" -> NotFound
    /// - "already taken" / "already exists" -> Conflict
    /// - "invalid" / "must be" / "must have" / "cannot" -> BadRequest
    /// - Default -> Internal
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let msg = err.to_string();
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("not found") {
            ApiError::NotFound(msg)
        } else if msg_lower.contains("already taken") || msg_lower.contains("already exists") {
            ApiError::Conflict(msg)
        } else if msg_lower.contains("invalid")
            || msg_lower.contains("must be")
            || msg_lower.contains("must have")
            || msg_lower.contains("cannot")
        {
            ApiError::BadRequest(msg)
        } else {
            // Keep the whole context chain for the log line.
            ApiError::Internal(format!("{err:#}"))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            ApiError::Auth(err) => return err.into_response(),
            ApiError::Internal(msg) => {
                error!(message = %msg, "API error");
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!(status = status.as_u16(), message = %other, "Client error");
                other.to_string()
            }
        };

        Envelope::<()>::failed(status, message).into_response()
    }
}

/// Convert anyhow errors to API errors using the centralized categorization logic.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::from_anyhow(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_error_categorization_not_found() {
        let err = anyhow::anyhow!("Sale order not found: 42");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::NotFound(_)));
    }

    #[test]
    fn test_error_categorization_conflict_taken() {
        let err = anyhow::anyhow!("Username 'kasir' is already taken.");
        assert!(matches!(ApiError::from_anyhow(err), ApiError::Conflict(_)));
    }

    #[test]
    fn test_error_categorization_bad_request() {
        for msg in [
            "Invalid username format.",
            "Password must be at least 6 characters.",
            "A sale order must have at least one item.",
            "Quantity cannot be zero.",
        ] {
            assert!(
                matches!(ApiError::from_anyhow(anyhow::anyhow!(msg)), ApiError::BadRequest(_)),
                "{msg}"
            );
        }
    }

    #[test]
    fn test_error_categorization_internal_default() {
        let err = anyhow::anyhow!("disk I/O error").context("Failed to insert sale order");
        match ApiError::from_anyhow(err) {
            ApiError::Internal(msg) => assert!(msg.contains("disk I/O error")),
            other => panic!("expected Internal, got {other:?}"),
        }
    }

    #[test]
    fn test_error_response_status_codes() {
        assert_eq!(ApiError::not_found("").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::bad_request("").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::conflict("").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(AuthError::ExpiredToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InsufficientRole {
                role: Role::Cashier,
                required: "owner".to_string(),
            })
            .status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_not_exposed() {
        let response = ApiError::internal("connection pool exhausted").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["status"], "failed");
        assert_eq!(body["code"], 500);
    }
}
