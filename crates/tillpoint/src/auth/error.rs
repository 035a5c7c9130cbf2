//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::Envelope;

use super::Role;

/// Message returned for every failed authentication check on a protected route.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid or missing authentication token";

/// Message returned for failed logins, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Message returned when the role check fails.
pub const FORBIDDEN_MESSAGE: &str = "You don't have permission to access this resource";

/// Authentication errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user, inactive user or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing authorization header.
    #[error("missing authorization header")]
    MissingAuthHeader,

    /// Authorization header is not `Bearer <token>`.
    #[error("malformed authorization header")]
    MalformedAuthHeader,

    /// Token was revoked by logout.
    #[error("token has been revoked")]
    RevokedToken,

    /// Signature does not match the token content.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token is structurally invalid or carries unreadable claims.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Token expired.
    #[error("token expired")]
    ExpiredToken,

    /// Role not in the route's allow-list.
    #[error("role {role} is not allowed (requires {required})")]
    InsufficientRole { role: Role, required: String },

    /// Internal error.
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether the error belongs to the authentication stage (401).
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(
            self,
            AuthError::InsufficientRole { .. } | AuthError::Internal(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message. Deliberately does not say which check failed.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE,
            AuthError::InsufficientRole { .. } => FORBIDDEN_MESSAGE,
            AuthError::Internal(_) => "Authentication failed due to an internal error",
            _ => UNAUTHORIZED_MESSAGE,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Authentication internal error");
            }
            other => {
                tracing::debug!(reason = %other, status = status.as_u16(), "Request rejected");
            }
        }

        let body: Envelope<()> = Envelope::failed(status, self.public_message());
        (status, Json(body)).into_response()
    }
}
