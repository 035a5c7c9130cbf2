//! Health check and fallback handlers.

use axum::http::StatusCode;

use crate::api::Envelope;

/// Health check endpoint.
pub async fn health() -> Envelope<()> {
    Envelope::message(StatusCode::OK, "Service is healthy")
}

/// Unknown route.
pub async fn not_found() -> Envelope<()> {
    Envelope::failed(StatusCode::NOT_FOUND, "Route not found")
}

/// Known route, unsupported method.
pub async fn method_not_allowed() -> Envelope<()> {
    Envelope::failed(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
