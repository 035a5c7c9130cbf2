//! Signed session tokens (HS256 JWT).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{AuthError, Claims, Identity};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues and verifies tokens with a server-held secret.
///
/// Stateless: the only state is the key material derived from the secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked by `verify_at` with zero leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for `identity` valid for `ttl` from now.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now().timestamp(), ttl)
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    pub fn issue_at(&self, identity: &Identity, now: i64, ttl: Duration) -> Result<String, AuthError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: identity.user_id,
            username: identity.username.clone(),
            role: identity.role,
            iat: now,
            exp: now.saturating_add(ttl_secs),
            jti: nanoid::nanoid!(16),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the current time were `now` (Unix seconds).
    ///
    /// Order: structure, signature over `header.payload`, claim decoding, expiry.
    /// No claim is looked at before the signature has been checked.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let (message, signature) = split_token(token)?;

        let signature_ok =
            jsonwebtoken::crypto::verify(signature, message.as_bytes(), &self.decoding_key, ALGORITHM)
                .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        if !signature_ok {
            return Err(AuthError::InvalidSignature);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::MalformedToken(e.to_string()),
            }
        })?;

        if data.claims.is_expired_at(now) {
            return Err(AuthError::ExpiredToken);
        }

        Ok(data.claims)
    }
}

/// Split `header.payload.signature` into (`header.payload`, `signature`).
fn split_token(token: &str) -> Result<(&str, &str), AuthError> {
    let malformed = || AuthError::MalformedToken("expected three non-empty segments".to_string());

    let (message, signature) = token.rsplit_once('.').ok_or_else(malformed)?;
    let (header, payload) = message.split_once('.').ok_or_else(malformed)?;

    if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.') {
        return Err(malformed());
    }

    Ok((message, signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    const SECRET: &str = "test-secret-for-unit-tests-minimum-32-chars-long";
    const T0: i64 = 1_700_000_000;
    const HOUR: Duration = Duration::from_secs(3600);

    fn identity() -> Identity {
        Identity {
            user_id: 7,
            username: "owner".to_string(),
            role: Role::Owner,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue(&identity(), HOUR).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.identity(), identity());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_issue_at_sets_expiry_from_ttl() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue_at(&identity(), T0, HOUR * 24).unwrap();

        let claims = codec.verify_at(&token, T0 + 10).unwrap();
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 24 * 3600);
    }

    #[test]
    fn test_tokens_are_unique_per_issue() {
        let codec = TokenCodec::new(SECRET);
        let a = codec.issue_at(&identity(), T0, HOUR).unwrap();
        let b = codec.issue_at(&identity(), T0, HOUR).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let codec = TokenCodec::new(SECRET);

        let token = codec.issue_at(&identity(), T0, Duration::ZERO).unwrap();
        assert_eq!(codec.verify_at(&token, T0), Err(AuthError::ExpiredToken));

        let token = codec.issue(&identity(), Duration::ZERO).unwrap();
        assert_eq!(codec.verify(&token), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn test_elapsed_token_is_expired() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue_at(&identity(), T0, HOUR).unwrap();

        assert!(codec.verify_at(&token, T0 + 3599).is_ok());
        assert_eq!(codec.verify_at(&token, T0 + 3600), Err(AuthError::ExpiredToken));
        assert_eq!(codec.verify_at(&token, T0 + 7200), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn test_any_altered_byte_fails_signature() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue_at(&identity(), T0, HOUR).unwrap();

        for (i, byte) in token.bytes().enumerate() {
            if byte == b'.' {
                continue;
            }
            let mut tampered = token.clone().into_bytes();
            tampered[i] = if byte == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(tampered).unwrap();

            assert_eq!(
                codec.verify_at(&tampered, T0 + 1),
                Err(AuthError::InvalidSignature),
                "byte {i} altered"
            );
        }
    }

    #[test]
    fn test_wrong_secret_fails_signature() {
        let issuer = TokenCodec::new(SECRET);
        let other = TokenCodec::new("another-secret-that-is-also-32-characters-long");
        let token = issuer.issue_at(&identity(), T0, HOUR).unwrap();

        assert_eq!(other.verify_at(&token, T0 + 1), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = TokenCodec::new(SECRET);
        let cases = ["", "abc", "a.b", "a..c", ".b.c", "a.b.", "a.b.c.d"];

        for case in cases {
            assert!(
                matches!(codec.verify_at(case, T0), Err(AuthError::MalformedToken(_))),
                "{case:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_signed_garbage_payload_is_malformed() {
        let codec = TokenCodec::new(SECRET);
        let message = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.bm90LWpzb24";
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let signature = jsonwebtoken::crypto::sign(message.as_bytes(), &key, ALGORITHM).unwrap();
        let token = format!("{message}.{signature}");

        assert!(matches!(
            codec.verify_at(&token, T0),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_signed_unknown_role_is_rejected() {
        #[derive(serde::Serialize)]
        struct Forged<'a> {
            sub: i64,
            username: &'a str,
            role: &'a str,
            iat: i64,
            exp: i64,
            jti: &'a str,
        }

        let forged = Forged {
            sub: 1,
            username: "mallory",
            role: "admin",
            iat: T0,
            exp: T0 + 3600,
            jti: "x",
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &forged,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let codec = TokenCodec::new(SECRET);
        assert!(matches!(
            codec.verify_at(&token, T0 + 1),
            Err(AuthError::MalformedToken(_))
        ));
    }
}
