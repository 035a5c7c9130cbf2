//! Authentication middleware (request gate).

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use super::{AuthError, Claims, Identity, RevocationStore, Role, TokenCodec};

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched exactly, followed by one space and a token without
/// whitespace.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedAuthHeader)?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(AuthError::MalformedAuthHeader);
    }

    Ok(token)
}

/// Authentication state shared by the gate.
#[derive(Debug, Clone)]
pub struct AuthState {
    codec: TokenCodec,
    revocations: RevocationStore,
}

impl AuthState {
    pub fn new(codec: TokenCodec, revocations: RevocationStore) -> Self {
        Self { codec, revocations }
    }

    pub fn revocations(&self) -> &RevocationStore {
        &self.revocations
    }

    /// Authenticate an `Authorization` header value.
    pub fn authenticate(&self, header: Option<&str>) -> Result<CurrentUser, AuthError> {
        self.authenticate_at(header, Utc::now().timestamp())
    }

    /// Authenticate as if the current time were `now` (Unix seconds).
    ///
    /// Revocation is checked before the signature: both must pass.
    pub fn authenticate_at(&self, header: Option<&str>, now: i64) -> Result<CurrentUser, AuthError> {
        let header = header.ok_or(AuthError::MissingAuthHeader)?;
        let token = bearer_token_from_header(header)?;

        if self.revocations.is_revoked(token) {
            return Err(AuthError::RevokedToken);
        }

        let claims = self.codec.verify_at(token, now)?;

        Ok(CurrentUser::from_verified(claims, token.to_string()))
    }
}

/// Authenticated user extracted from request.
///
/// Only the gate creates values of this type, so holding one proves the
/// request carried a valid, unrevoked token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    claims: Claims,
    token: String,
}

impl CurrentUser {
    pub(super) fn from_verified(claims: Claims, token: String) -> Self {
        Self { claims, token }
    }

    pub fn user_id(&self) -> i64 {
        self.claims.sub
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn identity(&self) -> Identity {
        self.claims.identity()
    }

    pub fn issued_at(&self) -> i64 {
        self.claims.iat
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    /// The raw token this request was authenticated with.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Extract authentication from request.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Authentication middleware.
///
/// Validates the bearer token and injects `CurrentUser` into request extensions.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| AuthError::MalformedAuthHeader)?),
    };

    // Rejections are logged when rendered (`AuthError::into_response`).
    let user = auth.authenticate(header)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
