//! Response envelope shared by every endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{"code", "status", "message", "data"}` body.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    #[serde(skip)]
    http_status: StatusCode,
    pub code: u16,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            http_status: status,
            code: status.as_u16(),
            status: "success",
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failed(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            http_status: status,
            code: status.as_u16(),
            status: "failed",
            message: message.into(),
            data: None,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::CREATED, message, data)
    }
}

impl Envelope<()> {
    /// Success without a `data` field.
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            data: None,
            ..Self::success(status, message, ())
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.http_status, Json(self)).into_response()
    }
}
