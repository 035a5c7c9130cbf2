//! Role-based access control.
//!
//! Checks are written against [`CurrentUser`], which only the authentication
//! gate can produce, so a role check can never run on an unauthenticated
//! request: without the gate the extractor fails with `Unauthorized`.

use std::marker::PhantomData;
use std::ops::Deref;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use super::{AuthError, CurrentUser, Role};

/// Pass if `user`'s role is in `allowed`, otherwise `InsufficientRole`.
pub fn require_role(user: &CurrentUser, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&user.role()) {
        return Ok(());
    }

    Err(AuthError::InsufficientRole {
        role: user.role(),
        required: allowed
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join("|"),
    })
}

/// A fixed allow-list of roles.
pub trait RolePolicy: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

/// Owners only.
#[derive(Debug, Clone, Copy)]
pub struct OwnerOnly;

impl RolePolicy for OwnerOnly {
    const ALLOWED: &'static [Role] = &[Role::Owner];
}

/// Any staff member (owner or cashier).
#[derive(Debug, Clone, Copy)]
pub struct AnyStaff;

impl RolePolicy for AnyStaff {
    const ALLOWED: &'static [Role] = &[Role::Owner, Role::Cashier];
}

/// A `CurrentUser` whose role passed policy `P`.
pub struct Authorized<P: RolePolicy> {
    user: CurrentUser,
    _policy: PhantomData<fn() -> P>,
}

impl<P: RolePolicy> Authorized<P> {
    /// Apply policy `P` to an authenticated user.
    pub fn check(user: CurrentUser) -> Result<Self, AuthError> {
        require_role(&user, P::ALLOWED)?;
        Ok(Self {
            user,
            _policy: PhantomData,
        })
    }

    pub fn into_inner(self) -> CurrentUser {
        self.user
    }
}

impl<P: RolePolicy> Clone for Authorized<P> {
    fn clone(&self) -> Self {
        Self {
            user: self.user.clone(),
            _policy: PhantomData,
        }
    }
}

impl<P: RolePolicy> std::fmt::Debug for Authorized<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("user", &self.user)
            .field("allowed", &P::ALLOWED)
            .finish()
    }
}

impl<P: RolePolicy> Deref for Authorized<P> {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        Self::check(user)
    }
}

/// Route-layer middleware enforcing policy `P` on a whole route group.
///
/// Use with `axum::middleware::from_fn(require_policy::<OwnerOnly>)`, inside
/// the authentication layer.
pub async fn require_policy<P: RolePolicy>(
    _authorized: Authorized<P>,
    req: Request,
    next: Next,
) -> Response {
    next.run(req).await
}
