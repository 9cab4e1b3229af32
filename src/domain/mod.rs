//! Domain layer - error taxonomy and record capabilities

pub mod error;
pub mod record;

pub use error::{AuthError, DataError};
pub use record::{apply_patch, DataAccessor, Record, RecordKey};
