//! JSON Web Key set parsing and verification-key reconstruction

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;

use crate::domain::AuthError;

/// A single JSON Web Key record as published in a provider's jwks.json.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (RSA, oct)
    pub kty: String,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm
    pub alg: Option<String>,
    /// Intended key use
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus (base64url)
    pub n: Option<String>,
    /// RSA public exponent (base64url)
    pub e: Option<String>,
    /// Symmetric key value (base64url) for oct keys
    pub k: Option<String>,
}

/// The `keys` array fetched from the provider's well-known JWKS location.
///
/// Key order is the fetch order; lookups scan linearly and take the
/// first match.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Finds the first key whose `kid` equals the given identifier.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

impl Jwk {
    /// Reconstructs a verification key and its algorithm from this record.
    pub fn decoding_key(&self) -> Result<(DecodingKey, Algorithm), AuthError> {
        match self.kty.as_str() {
            "RSA" => self.rsa_decoding_key(),
            "oct" => self.symmetric_decoding_key(),
            other => Err(AuthError::verification(format!(
                "unsupported key type '{}', expected RSA or oct",
                other
            ))),
        }
    }

    fn rsa_decoding_key(&self) -> Result<(DecodingKey, Algorithm), AuthError> {
        let algorithm = match self.alg.as_deref() {
            Some("RS256") | None => Algorithm::RS256,
            Some("RS384") => Algorithm::RS384,
            Some("RS512") => Algorithm::RS512,
            Some(alg) => {
                return Err(AuthError::verification(format!(
                    "unsupported RSA algorithm '{}'",
                    alg
                )));
            }
        };

        let n = self
            .n
            .as_ref()
            .ok_or_else(|| AuthError::verification("RSA key missing 'n' (modulus)"))?;
        let e = self
            .e
            .as_ref()
            .ok_or_else(|| AuthError::verification("RSA key missing 'e' (public exponent)"))?;

        let key = DecodingKey::from_rsa_components(n, e)?;

        Ok((key, algorithm))
    }

    fn symmetric_decoding_key(&self) -> Result<(DecodingKey, Algorithm), AuthError> {
        let algorithm = match self.alg.as_deref() {
            Some("HS256") | None => Algorithm::HS256,
            Some("HS384") => Algorithm::HS384,
            Some("HS512") => Algorithm::HS512,
            Some(alg) => {
                return Err(AuthError::verification(format!(
                    "unsupported symmetric algorithm '{}'",
                    alg
                )));
            }
        };

        let k = self
            .k
            .as_ref()
            .ok_or_else(|| AuthError::verification("symmetric key missing 'k' value"))?;
        let secret = URL_SAFE_NO_PAD.decode(k)?;

        Ok((DecodingKey::from_secret(&secret), algorithm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cognito_shaped_jwks() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "key-1", "alg": "RS256", "use": "sig", "n": "AQAB", "e": "AQAB"},
                {"kty": "RSA", "kid": "key-2", "alg": "RS256", "use": "sig", "n": "AQAB", "e": "AQAB"}
            ]
        }"#;

        let set: JwkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.keys.len(), 2);
        assert_eq!(set.find("key-2").unwrap().kid.as_deref(), Some("key-2"));
        assert!(set.find("key-3").is_none());
    }

    #[test]
    fn test_find_returns_first_match_in_fetch_order() {
        let json = r#"{
            "keys": [
                {"kty": "RSA", "kid": "dup", "alg": "RS256", "n": "AQAB", "e": "AQAB"},
                {"kty": "oct", "kid": "dup", "alg": "HS256", "k": "c2VjcmV0"}
            ]
        }"#;

        let set: JwkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.find("dup").unwrap().kty, "RSA");
    }

    #[test]
    fn test_symmetric_key_reconstruction() {
        let jwk = Jwk {
            kty: "oct".to_string(),
            kid: Some("hmac-key".to_string()),
            alg: Some("HS256".to_string()),
            key_use: None,
            n: None,
            e: None,
            k: Some(URL_SAFE_NO_PAD.encode(b"a-shared-secret")),
        };

        let (_, algorithm) = jwk.decoding_key().unwrap();
        assert_eq!(algorithm, Algorithm::HS256);
    }

    #[test]
    fn test_unsupported_key_type() {
        let jwk = Jwk {
            kty: "EC".to_string(),
            kid: None,
            alg: None,
            key_use: None,
            n: None,
            e: None,
            k: None,
        };

        let result = jwk.decoding_key();
        assert!(matches!(result, Err(AuthError::Verification(_))));
    }

    #[test]
    fn test_rsa_key_missing_modulus() {
        let jwk = Jwk {
            kty: "RSA".to_string(),
            kid: Some("broken".to_string()),
            alg: Some("RS256".to_string()),
            key_use: None,
            n: None,
            e: Some("AQAB".to_string()),
            k: None,
        };

        let result = jwk.decoding_key();
        assert!(matches!(result, Err(AuthError::Verification(_))));
    }
}
