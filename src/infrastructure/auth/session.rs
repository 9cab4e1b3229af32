//! Self-issued session tokens and password secrecy

use std::fmt::Display;

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::domain::AuthError;

/// Fixed symmetric signing algorithm for self-issued session tokens.
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by a self-issued session token.
///
/// No verification counterpart lives here: the embedding application
/// decodes these with the shared secret and checks `exp` itself, the
/// same way provider tokens are checked once the key is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Stringified subject
    pub sub: String,
}

/// Signs a session token for the given subject, expiring at `expire_at`.
pub fn issue_token(
    subject: impl Display,
    expire_at: DateTime<Utc>,
    secret_key: &str,
) -> Result<String, AuthError> {
    let claims = SessionClaims {
        exp: expire_at.timestamp(),
        sub: subject.to_string(),
    };

    Ok(encode(
        &Header::new(SESSION_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret_key.as_bytes()),
    )?)
}

/// Produces a salted Argon2 hash suitable for storage.
///
/// Each call draws a fresh random salt, so repeated calls on the same
/// input produce different outputs.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Checks a plaintext password against a stored hash using the hash's
/// embedded salt. The comparison is constant-time; malformed hashes
/// verify as `false`.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const SECRET: &str = "session-secret-for-tests";

    #[test]
    fn test_issue_and_decode_round_trip() {
        let expire_at = Utc::now() + Duration::hours(1);
        let token = issue_token(42, expire_at, SECRET).unwrap();

        let decoded = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::new(SESSION_ALGORITHM),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, "42");
        assert_eq!(decoded.claims.exp, expire_at.timestamp());
    }

    #[test]
    fn test_issued_token_rejected_with_wrong_secret() {
        let expire_at = Utc::now() + Duration::hours(1);
        let token = issue_token("user-1", expire_at, SECRET).unwrap();

        let result = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"a-different-secret"),
            &Validation::new(SESSION_ALGORITHM),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_rejected_on_decode() {
        let expire_at = Utc::now() - Duration::hours(1);
        let token = issue_token("user-1", expire_at, SECRET).unwrap();

        let result = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::new(SESSION_ALGORITHM),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("my_secure_password").unwrap();

        assert!(verify_password("my_secure_password", &hash));
        assert!(!verify_password("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_salted_per_call() {
        let hash1 = hash_password("my_secure_password").unwrap();
        let hash2 = hash_password("my_secure_password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("my_secure_password", &hash1));
        assert!(verify_password("my_secure_password", &hash2));
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(!verify_password("password", "not-a-phc-string"));
        assert!(!verify_password("password", ""));
    }

    #[test]
    fn test_empty_password() {
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash));
        assert!(!verify_password("x", &hash));
    }
}
