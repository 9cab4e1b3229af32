//! Bearer-token verification against a Cognito user pool's published JWKS

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{crypto, decode_header};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::AuthError;

use super::jwks::JwkSet;

/// Claims mapping produced after successful verification.
pub type Claims = Map<String, Value>;

/// Bounded timeout for the one-shot JWKS fetch at construction.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Verifies externally issued bearer tokens against a provider's
/// published signing keys.
///
/// The key set is fetched once at construction and held immutably for
/// the verifier's lifetime; a rotated remote key set is not observed
/// until the verifier is rebuilt. Concurrent `verify` calls are safe
/// since verification only reads the held keys.
#[derive(Debug, Clone)]
pub struct CognitoVerifier {
    app_client_id: String,
    keys: JwkSet,
}

impl CognitoVerifier {
    /// Returns the well-known JWKS URL for a Cognito user pool.
    pub fn jwks_url(region: &str, user_pool_id: &str) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}/.well-known/jwks.json",
            region, user_pool_id
        )
    }

    /// Builds a verifier for a Cognito user pool, fetching the pool's
    /// key set from its well-known location.
    ///
    /// Fails if the fetch or parse fails; there is no retry or lazy
    /// loading.
    pub async fn discover(
        region: &str,
        user_pool_id: &str,
        app_client_id: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Self::from_jwks_url(&Self::jwks_url(region, user_pool_id), app_client_id).await
    }

    /// Builds a verifier from an arbitrary JWKS URL.
    pub async fn from_jwks_url(
        url: &str,
        app_client_id: impl Into<String>,
    ) -> Result<Self, AuthError> {
        info!("loading jwks from {}", url);

        let client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()?;

        let keys = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;

        Ok(Self::from_key_set(keys, app_client_id))
    }

    /// Builds a verifier from an already-parsed key set.
    pub fn from_key_set(keys: JwkSet, app_client_id: impl Into<String>) -> Self {
        Self {
            app_client_id: app_client_id.into(),
            keys,
        }
    }

    /// Validates a bearer token's authenticity, freshness and intended
    /// audience, returning its full claims mapping.
    ///
    /// The checks run in a fixed order: key id extraction, key lookup,
    /// signature verification, expiration, audience. Each named failure
    /// maps to its own [`AuthError`] variant; anything else surfaces as
    /// [`AuthError::Verification`] with the root cause in the message.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let key = self
            .keys
            .find(&kid)
            .ok_or_else(|| AuthError::key_not_found(kid.as_str()))?;
        let (decoding_key, algorithm) = key.decoding_key()?;

        let (message, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| AuthError::verification("token is not in compact three-segment form"))?;

        if !crypto::verify(signature, message.as_bytes(), &decoding_key, algorithm)? {
            return Err(AuthError::SignatureInvalid);
        }

        // Signature checked above, so the raw claims are safe to read
        // without a second verification pass.
        let claims = decode_claims(token)?;
        debug!(?claims, "token signature verified");

        // `as_f64` accepts any JSON number, integer or float.
        let exp = claims
            .get("exp")
            .and_then(Value::as_f64)
            .ok_or_else(|| AuthError::verification("claims missing numeric 'exp'"))?;
        if Utc::now().timestamp() as f64 > exp {
            return Err(AuthError::TokenExpired);
        }

        // Cognito id tokens carry `aud`; access tokens carry `client_id`.
        let audience = claims
            .get("aud")
            .or_else(|| claims.get("client_id"))
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::verification("claims missing 'aud' or 'client_id'"))?;
        if audience != self.app_client_id {
            return Err(AuthError::audience_mismatch(self.app_client_id.as_str()));
        }

        Ok(claims)
    }
}

/// Decodes the payload segment without verifying the signature.
fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::verification("token has no payload segment"))?;
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;

    Ok(serde_json::from_slice(&bytes)?)
}
