//! Record capability traits

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as record keys.
pub trait RecordKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for backends that store string keys
    fn as_str(&self) -> &str;
}

impl RecordKey for String {
    fn as_str(&self) -> &str {
        self
    }
}

/// Trait for application-defined records managed by a data accessor.
///
/// The serde bounds make every record field-enumerable: serializing to a
/// JSON object yields the record's own field set, which is what partial
/// updates are matched against.
pub trait Record: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type identifying this record
    type Key: RecordKey;

    /// The input type a new record is constructed from
    type Create: Debug + Send;

    /// Returns the record's key
    fn key(&self) -> &Self::Key;

    /// Builds a new record from creation input, filling any fields the
    /// input does not carry (generated ids, defaults).
    fn from_create(input: Self::Create) -> Self;
}
