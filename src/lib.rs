//! Shared authentication and data-access helpers for web API backends
//!
//! Three independent components, no shared runtime state between them:
//! - [`CognitoVerifier`]: fetches a user pool's public signing keys once,
//!   then validates bearer tokens against them.
//! - Session helpers ([`issue_token`], [`hash_password`],
//!   [`verify_password`]): locally signed session tokens and password
//!   secrecy.
//! - [`DataAccessor`]: generic create/read/update/delete over any
//!   [`Record`] type, backed by Postgres or memory.
//!
//! The embedding HTTP layer owns routing, request handling and retry
//! policy; this crate only provides the helpers it calls into.

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{apply_patch, AuthError, DataAccessor, DataError, Record, RecordKey};
pub use infrastructure::auth::{
    hash_password, issue_token, verify_password, Claims, CognitoVerifier, Jwk, JwkSet,
    SessionClaims, SESSION_ALGORITHM,
};
pub use infrastructure::data::{MemoryAccessor, PostgresAccessor, PostgresConfig};
