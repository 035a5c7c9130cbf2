//! Authentication configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum accepted length of the signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. REQUIRED.
    /// Either a literal or `env:VAR_NAME` to read it from the environment.
    pub jwt_secret: Option<String>,

    /// Token lifetime in whole hours.
    pub token_ttl_hours: u64,

    /// Interval between sweeps of expired revocation entries, in seconds.
    pub revocation_sweep_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No default secret - must be explicitly configured
            jwt_secret: None,
            token_ttl_hours: 24,
            revocation_sweep_secs: 300,
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    /// Returns the resolved secret or None if not configured.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else if value.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration and return the resolved secret.
    ///
    /// Any error here is fatal at startup.
    pub fn validate(&self) -> Result<String, ConfigValidationError> {
        let secret = self
            .resolve_jwt_secret()?
            .ok_or(ConfigValidationError::MissingJwtSecret)?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }

        if self.token_ttl_hours == 0 {
            return Err(ConfigValidationError::ZeroTokenTtl);
        }

        Ok(secret)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(3600))
    }

    pub fn revocation_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.revocation_sweep_secs.max(1))
    }

    /// Generate a secure random JWT secret.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error(
        "JWT secret is required. Set TILLPOINT__AUTH__JWT_SECRET or auth.jwt_secret in the config file."
    )]
    MissingJwtSecret,

    #[error("JWT secret must be at least 32 characters long.")]
    JwtSecretTooShort,

    #[error("auth.token_ttl_hours must be at least 1.")]
    ZeroTokenTtl,

    #[error("Environment variable '{0}' not found (referenced via env:{0} in config).")]
    EnvVarNotFound(String),

    #[error("Environment variable '{0}' is empty (referenced via env:{0} in config).")]
    EnvVarEmpty(String),
}
