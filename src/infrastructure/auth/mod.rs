//! Authentication infrastructure module
//!
//! Provider-token verification against a published JWKS, plus
//! self-issued session tokens and password hashing.

mod jwks;
mod session;
mod verifier;

pub use jwks::{Jwk, JwkSet};
pub use session::{
    hash_password, issue_token, verify_password, SessionClaims, SESSION_ALGORITHM,
};
pub use verifier::{Claims, CognitoVerifier};
