//! In-memory data accessor

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::record::{apply_patch, missing_record, DataAccessor, Record, RecordKey};
use crate::domain::DataError;

/// Thread-safe in-memory accessor.
///
/// Useful for tests and development. Records live in a BTreeMap so
/// `list` walks them in key order, matching the ordering the Postgres
/// accessor gets from its ORDER BY. Data is lost when the process
/// terminates.
#[derive(Debug)]
pub struct MemoryAccessor<R>
where
    R: Record,
{
    records: RwLock<BTreeMap<String, R>>,
}

impl<R> Default for MemoryAccessor<R>
where
    R: Record,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R> MemoryAccessor<R>
where
    R: Record,
{
    /// Creates an empty accessor
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an accessor pre-populated with records
    pub fn with_records(records: Vec<R>) -> Self {
        let accessor = Self::new();
        {
            let mut map = accessor.records.write().unwrap();

            for record in records {
                map.insert(record.key().as_str().to_string(), record);
            }
        }
        accessor
    }
}

#[async_trait]
impl<R> DataAccessor<R> for MemoryAccessor<R>
where
    R: Record + 'static,
{
    async fn get(&self, key: &R::Key) -> Result<Option<R>, DataError> {
        let records = self
            .records
            .read()
            .map_err(|e| DataError::storage(format!("failed to acquire read lock: {}", e)))?;

        Ok(records.get(key.as_str()).cloned())
    }

    async fn list(&self, skip: u64, limit: Option<u64>) -> Result<Vec<R>, DataError> {
        let records = self
            .records
            .read()
            .map_err(|e| DataError::storage(format!("failed to acquire read lock: {}", e)))?;

        let remaining = records.values().skip(skip as usize);

        Ok(match limit {
            Some(limit) => remaining.take(limit as usize).cloned().collect(),
            None => remaining.cloned().collect(),
        })
    }

    async fn create(&self, input: R::Create) -> Result<R, DataError> {
        let record = R::from_create(input);
        let key = record.key().as_str().to_string();

        let mut records = self
            .records
            .write()
            .map_err(|e| DataError::storage(format!("failed to acquire write lock: {}", e)))?;

        if records.contains_key(&key) {
            return Err(DataError::conflict(format!(
                "record with key '{}' already exists",
                key
            )));
        }

        records.insert(key, record.clone());
        Ok(record)
    }

    async fn update(&self, existing: R, patch: Map<String, Value>) -> Result<R, DataError> {
        let updated = apply_patch(&existing, &patch)?;
        let old_key = existing.key().as_str().to_string();
        let new_key = updated.key().as_str().to_string();

        let mut records = self
            .records
            .write()
            .map_err(|e| DataError::storage(format!("failed to acquire write lock: {}", e)))?;

        if !records.contains_key(&old_key) {
            return Err(missing_record(existing.key()));
        }

        // A key-changing patch migrates the row; landing on another
        // record's key is a conflict, same as create.
        if new_key != old_key && records.contains_key(&new_key) {
            return Err(DataError::conflict(format!(
                "record with key '{}' already exists",
                new_key
            )));
        }

        records.remove(&old_key);
        records.insert(new_key, updated.clone());
        Ok(updated)
    }

    async fn remove(&self, key: &R::Key) -> Result<R, DataError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| DataError::storage(format!("failed to acquire write lock: {}", e)))?;

        records
            .remove(key.as_str())
            .ok_or_else(|| missing_record(key))
    }
}
