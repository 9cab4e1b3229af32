//! Record domain - generic data-access abstraction

mod accessor;
mod entity;

pub use accessor::{apply_patch, DataAccessor};
pub use entity::{Record, RecordKey};

pub(crate) use accessor::missing_record;
