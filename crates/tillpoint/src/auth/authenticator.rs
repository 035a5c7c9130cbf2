//! Credential verification, login and logout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::password::{verify_against_dummy, verify_password_blocking};
use super::{AuthError, CurrentUser, Identity, RevocationStore, Role, TokenCodec};

/// Credential record of an active account.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
}

/// Lookup of credentials by username. Implemented by the persistence layer.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Return the credential of the *active* account named `username`, if any.
    async fn find_active_by_username(&self, username: &str) -> anyhow::Result<Option<StoredCredential>>;
}

/// Account summary returned alongside a fresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: AccountSummary,
}

/// Verifies credentials and mints tokens.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    revocations: RevocationStore,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        revocations: RevocationStore,
        ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            codec,
            revocations,
            ttl,
        }
    }

    /// Check `username`/`password` and issue a token.
    ///
    /// Unknown user, inactive user and wrong password all yield
    /// `InvalidCredentials`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let credential = self
            .credentials
            .find_active_by_username(username)
            .await
            .map_err(|e| AuthError::Internal(format!("credential lookup failed: {e:#}")))?;

        let Some(credential) = credential else {
            verify_against_dummy(password)
                .await
                .map_err(|e| AuthError::Internal(format!("{e:#}")))?;
            warn!("Login rejected: no active account");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = verify_password_blocking(password, &credential.password_hash)
            .await
            .map_err(|e| AuthError::Internal(format!("{e:#}")))?;
        if !matches {
            warn!(user_id = credential.user_id, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            user_id: credential.user_id,
            username: credential.username.clone(),
            role: credential.role,
        };
        let token = self.codec.issue(&identity, self.ttl)?;

        info!(user_id = credential.user_id, role = %credential.role, "Login successful");

        Ok(LoginOutcome {
            token,
            user: AccountSummary {
                id: credential.user_id,
                username: credential.username,
                name: credential.name,
                role: credential.role,
            },
        })
    }

    /// Revoke the token the current request was authenticated with.
    pub fn logout(&self, user: &CurrentUser) {
        self.revocations.revoke_until(user.token(), user.expires_at());
        info!(user_id = user.user_id(), "Logout: token revoked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::auth::AuthState;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-for-unit-tests-minimum-32-chars-long";

    struct MemoryCredentials {
        accounts: HashMap<String, (StoredCredential, bool)>,
    }

    #[async_trait]
    impl CredentialStore for MemoryCredentials {
        async fn find_active_by_username(
            &self,
            username: &str,
        ) -> anyhow::Result<Option<StoredCredential>> {
            Ok(self
                .accounts
                .get(username)
                .filter(|(_, active)| *active)
                .map(|(credential, _)| credential.clone()))
        }
    }

    struct FailingCredentials;

    #[async_trait]
    impl CredentialStore for FailingCredentials {
        async fn find_active_by_username(&self, _: &str) -> anyhow::Result<Option<StoredCredential>> {
            Err(anyhow::anyhow!("database is locked"))
        }
    }

    fn account(id: i64, username: &str, password: &str, role: Role, active: bool) -> (String, (StoredCredential, bool)) {
        (
            username.to_string(),
            (
                StoredCredential {
                    user_id: id,
                    username: username.to_string(),
                    name: format!("{username} name"),
                    role,
                    password_hash: hash_password(password).unwrap(),
                },
                active,
            ),
        )
    }

    fn setup() -> (Authenticator, AuthState) {
        let store = MemoryCredentials {
            accounts: HashMap::from([
                account(7, "owner", "owner123", Role::Owner, true),
                account(8, "cashier", "cashier123", Role::Cashier, true),
                account(9, "retired", "retired123", Role::Cashier, false),
            ]),
        };
        let codec = TokenCodec::new(SECRET);
        let revocations = RevocationStore::new();
        let authenticator = Authenticator::new(
            Arc::new(store),
            codec.clone(),
            revocations.clone(),
            Duration::from_secs(24 * 3600),
        );
        (authenticator, AuthState::new(codec, revocations))
    }

    #[tokio::test]
    async fn test_login_success_issues_verifiable_token() {
        let (authenticator, gate) = setup();
        let outcome = authenticator.login("owner", "owner123").await.unwrap();

        assert_eq!(
            outcome.user,
            AccountSummary {
                id: 7,
                username: "owner".to_string(),
                name: "owner name".to_string(),
                role: Role::Owner,
            }
        );

        let user = gate
            .authenticate(Some(&format!("Bearer {}", outcome.token)))
            .unwrap();
        assert_eq!(user.user_id(), 7);
        assert_eq!(user.role(), Role::Owner);
        assert_eq!(user.expires_at() - user.issued_at(), 24 * 3600);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let (authenticator, _) = setup();

        let wrong_password = authenticator.login("owner", "nope").await.unwrap_err();
        let unknown_user = authenticator.login("ghost", "owner123").await.unwrap_err();

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.public_message(), unknown_user.public_message());
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_login() {
        let (authenticator, _) = setup();
        let err = authenticator.login("retired", "retired123").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let authenticator = Authenticator::new(
            Arc::new(FailingCredentials),
            TokenCodec::new(SECRET),
            RevocationStore::new(),
            Duration::from_secs(3600),
        );
        let err = authenticator.login("owner", "owner123").await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn test_logout_revokes_presented_token() {
        let (authenticator, gate) = setup();
        let outcome = authenticator.login("cashier", "cashier123").await.unwrap();
        let header = format!("Bearer {}", outcome.token);

        let user = gate.authenticate(Some(&header)).unwrap();
        authenticator.logout(&user);

        assert_eq!(
            gate.authenticate(Some(&header)).unwrap_err(),
            AuthError::RevokedToken
        );
    }

    #[tokio::test]
    async fn test_concurrent_logins_get_independent_tokens() {
        let (authenticator, gate) = setup();

        let (a, b) = tokio::join!(
            authenticator.login("owner", "owner123"),
            authenticator.login("owner", "owner123")
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.token, b.token);

        let user_a = gate.authenticate(Some(&format!("Bearer {}", a.token))).unwrap();
        let user_b = gate.authenticate(Some(&format!("Bearer {}", b.token))).unwrap();
        assert_eq!(user_a.user_id(), 7);
        assert_eq!(user_b.user_id(), 7);

        // Logging out one session leaves the other usable.
        authenticator.logout(&user_a);
        assert!(gate.authenticate(Some(&format!("Bearer {}", b.token))).is_ok());
    }
}
