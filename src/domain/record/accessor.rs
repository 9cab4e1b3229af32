//! Data accessor trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::error::DataError;

use super::entity::{Record, RecordKey};

/// Generic create/read/update/delete accessor for a record type bound at
/// construction.
///
/// Every mutating operation is a single atomic transaction: a
/// persistence failure mid-operation leaves no partial write and
/// propagates to the caller unchanged.
#[async_trait]
pub trait DataAccessor<R>: Send + Sync + Debug
where
    R: Record + 'static,
{
    /// Point lookup by key. Absence is `Ok(None)`, never an error.
    async fn get(&self, key: &R::Key) -> Result<Option<R>, DataError>;

    /// Returns records ordered by key, offset by `skip` and capped by
    /// `limit` when given. The ordering is stable between calls absent
    /// underlying data changes.
    async fn list(&self, skip: u64, limit: Option<u64>) -> Result<Vec<R>, DataError>;

    /// Builds a record from the input and persists it, returning the
    /// refreshed row with any server-assigned fields populated.
    async fn create(&self, input: R::Create) -> Result<R, DataError>;

    /// Applies a partial field set to an existing record, addressed by
    /// the key it had before the patch. Only fields present in the patch
    /// AND on the record's own field set are overwritten; everything
    /// else is left untouched. A patch that changes the key field
    /// migrates the record to the new key, failing with
    /// [`DataError::Conflict`] if another record already holds it.
    async fn update(&self, existing: R, patch: Map<String, Value>) -> Result<R, DataError>;

    /// Deletes the record with the given key and returns its prior
    /// state. A missing record fails loudly with [`DataError::NotFound`];
    /// callers wanting a non-fatal miss should pre-check with `get`.
    async fn remove(&self, key: &R::Key) -> Result<R, DataError>;
}

/// Merges a partial field set into a record.
///
/// Fields absent from the record's own serialized field set are silently
/// ignored, so a patch can safely carry extra keys.
pub fn apply_patch<R: Record>(existing: &R, patch: &Map<String, Value>) -> Result<R, DataError> {
    let mut fields = match serde_json::to_value(existing)? {
        Value::Object(map) => map,
        other => {
            return Err(DataError::validation(format!(
                "record must serialize to an object, got {}",
                json_type_name(&other)
            )));
        }
    };

    for (field, value) in patch {
        if let Some(slot) = fields.get_mut(field) {
            *slot = value.clone();
        }
    }

    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Formats the standard not-found message for a record key.
pub(crate) fn missing_record<K: RecordKey>(key: &K) -> DataError {
    DataError::not_found(format!("record with key '{}' not found", key.as_str()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
