//! Password hashing (bcrypt).

use anyhow::{Context, Result};
use once_cell::sync::Lazy;

/// Hash verified against when the username is unknown, so a miss costs the
/// same bcrypt work as a wrong password.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| bcrypt::hash("tillpoint-placeholder-password", hash_cost()).unwrap_or_default());

/// bcrypt cost factor. Lower in debug builds for test speed.
pub fn hash_cost() -> u32 {
    if cfg!(debug_assertions) {
        4
    } else {
        bcrypt::DEFAULT_COST
    }
}

/// Hash a password using bcrypt (salted).
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, hash_cost()).context("Failed to hash password")
}

/// Verify a password against a bcrypt hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// `verify_password` on the blocking pool, keeping bcrypt off async workers.
pub async fn verify_password_blocking(password: &str, hash: &str) -> Result<bool> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("Password verification task failed")
}

/// Burn one verification's worth of work without a real account.
pub(crate) async fn verify_against_dummy(password: &str) -> Result<()> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let _ = verify_password(&password, &DUMMY_HASH);
    })
    .await
    .context("Password verification task failed")
}
