//! Authentication and authorization.
//!
//! - `token`: HS256 token issue/verify
//! - `revocation`: tokens revoked by logout
//! - `authenticator`: password login, logout
//! - `middleware`: per-request bearer-token gate producing `CurrentUser`
//! - `rbac`: role allow-lists on top of `CurrentUser`

mod authenticator;
mod claims;
mod config;
mod error;
mod middleware;
pub mod password;
mod rbac;
mod revocation;
mod token;

pub use authenticator::{
    AccountSummary, Authenticator, CredentialStore, LoginOutcome, StoredCredential,
};
pub use claims::{Claims, Identity, Role};
pub use config::{AuthConfig, ConfigValidationError, MIN_SECRET_LEN};
pub use error::AuthError;
pub use middleware::{AuthState, CurrentUser, auth_middleware};
pub use rbac::{AnyStaff, Authorized, OwnerOnly, RolePolicy, require_policy, require_role};
pub use revocation::RevocationStore;
pub use token::TokenCodec;
