//! End-to-end verifier tests against a mock JWKS endpoint

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webapi_shared::{AuthError, CognitoVerifier};

const JWKS_PATH: &str = "/.well-known/jwks.json";
const AUDIENCE: &str = "app1";

fn generate_key() -> RsaPrivateKey {
    let mut rng = OsRng;
    RsaPrivateKey::new(&mut rng, 2048).unwrap()
}

fn jwks_body(key: &RsaPrivateKey, kid: &str) -> Value {
    let public = key.to_public_key();
    json!({
        "keys": [
            {
                "kty": "RSA",
                "kid": kid,
                "alg": "RS256",
                "use": "sig",
                "n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be())
            }
        ]
    })
}

fn sign_rs256(key: &RsaPrivateKey, kid: &str, claims: &Value) -> String {
    let pem = key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap();
    let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &encoding_key).unwrap()
}

async fn serve_jwks(body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_verifies_token_signed_by_served_key() {
    let key = generate_key();
    let server = serve_jwks(jwks_body(&key, "k1")).await;

    let verifier = CognitoVerifier::from_jwks_url(&format!("{}{}", server.uri(), JWKS_PATH), AUDIENCE)
        .await
        .unwrap();

    let exp = Utc::now().timestamp() + 3600;
    let payload = json!({"sub": "user-1", "aud": AUDIENCE, "exp": exp});
    let token = sign_rs256(&key, "k1", &payload);

    let claims = verifier.verify(&token).unwrap();
    assert_eq!(claims.get("sub").unwrap(), "user-1");
    assert_eq!(claims.get("aud").unwrap(), AUDIENCE);
    assert_eq!(claims.get("exp").unwrap().as_i64().unwrap(), exp);
}

#[tokio::test]
async fn test_token_from_unserved_key_is_rejected() {
    let served = generate_key();
    let rogue = generate_key();
    let server = serve_jwks(jwks_body(&served, "k1")).await;

    let verifier = CognitoVerifier::from_jwks_url(&format!("{}{}", server.uri(), JWKS_PATH), AUDIENCE)
        .await
        .unwrap();

    let payload = json!({
        "sub": "user-1",
        "aud": AUDIENCE,
        "exp": Utc::now().timestamp() + 3600
    });

    // Unknown kid: key lookup fails before any signature work.
    let token = sign_rs256(&rogue, "k2", &payload);
    let result = verifier.verify(&token);
    assert!(matches!(result, Err(AuthError::KeyNotFound { kid }) if kid == "k2"));

    // Known kid but wrong private key: signature verification fails.
    let forged = sign_rs256(&rogue, "k1", &payload);
    let result = verifier.verify(&forged);
    assert!(matches!(result, Err(AuthError::SignatureInvalid)));
}

#[tokio::test]
async fn test_tampered_payload_fails_signature() {
    let key = generate_key();
    let server = serve_jwks(jwks_body(&key, "k1")).await;

    let verifier = CognitoVerifier::from_jwks_url(&format!("{}{}", server.uri(), JWKS_PATH), AUDIENCE)
        .await
        .unwrap();

    let payload = json!({
        "sub": "user-1",
        "aud": AUDIENCE,
        "exp": Utc::now().timestamp() + 3600
    });
    let token = sign_rs256(&key, "k1", &payload);

    let tampered_payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({
            "sub": "someone-else",
            "aud": AUDIENCE,
            "exp": Utc::now().timestamp() + 3600
        }))
        .unwrap(),
    );
    let mut segments: Vec<&str> = token.split('.').collect();
    segments[1] = &tampered_payload;
    let tampered = segments.join(".");

    let result = verifier.verify(&tampered);
    assert!(matches!(result, Err(AuthError::SignatureInvalid)));
}

#[tokio::test]
async fn test_fetch_failure_fails_construction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result =
        CognitoVerifier::from_jwks_url(&format!("{}{}", server.uri(), JWKS_PATH), AUDIENCE).await;
    assert!(matches!(result, Err(AuthError::Verification(_))));
}

#[tokio::test]
async fn test_malformed_jwks_body_fails_construction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let result =
        CognitoVerifier::from_jwks_url(&format!("{}{}", server.uri(), JWKS_PATH), AUDIENCE).await;
    assert!(matches!(result, Err(AuthError::Verification(_))));
}
