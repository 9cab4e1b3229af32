use thiserror::Error;

/// Token verification errors.
///
/// The first five variants form a closed set of verification-failure
/// kinds that callers can map directly to an HTTP response (typically
/// 401). They are never re-wrapped. Every other failure mode — malformed
/// token segments, JSON parse errors, network errors during JWKS
/// discovery — is wrapped exactly once into [`AuthError::Verification`]
/// with the source message preserved.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token header has no key id")]
    MissingKeyId,

    #[error("no key in the jwks matches kid '{kid}'")]
    KeyNotFound { kid: String },

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("token is expired")]
    TokenExpired,

    #[error("token was not issued for audience '{expected}'")]
    AudienceMismatch { expected: String },

    #[error("token verification failed: {0}")]
    Verification(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl AuthError {
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    pub fn audience_mismatch(expected: impl Into<String>) -> Self {
        Self::AudienceMismatch {
            expected: expected.into(),
        }
    }

    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification(message.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Verification(e.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        Self::Verification(e.to_string())
    }
}

impl From<base64::DecodeError> for AuthError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Verification(e.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Verification(e.to_string())
    }
}

/// Data accessor errors.
///
/// Persistence failures pass through unchanged via the transparent
/// [`DataError::Database`] variant; the accessor only names the failure
/// modes that belong to its own contract (missing record on
/// update/remove, key conflict on create, malformed patch input).
#[derive(Debug, Error)]
pub enum DataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

impl DataError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
