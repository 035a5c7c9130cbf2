//! Authentication handlers.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::{ApiJson, ApiResult, AppState, Envelope};
use crate::auth::{AccountSummary, CurrentUser, Role};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountSummary,
}

/// Identity carried by the presented token.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// `POST /auth/login`.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Envelope<LoginResponse>> {
    let outcome = state
        .authenticator
        .login(&request.username, &request.password)
        .await?;

    Ok(Envelope::ok(
        "Login successful",
        LoginResponse {
            token: outcome.token,
            user: outcome.user,
        },
    ))
}

/// `POST /auth/logout`: revoke the token this request carries.
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> Envelope<()> {
    state.authenticator.logout(&user);
    Envelope::message(StatusCode::OK, "Logout successful")
}

/// `GET /auth/me`.
pub async fn me(user: CurrentUser) -> Envelope<MeResponse> {
    Envelope::ok(
        "Current user retrieved successfully",
        MeResponse {
            id: user.user_id(),
            username: user.username().to_string(),
            role: user.role(),
            issued_at: user.issued_at(),
            expires_at: user.expires_at(),
        },
    )
}
