//! In-process test doubles for the mapping store.
//!
//! [`MemoryStore`] is the reference [`MappingStore`]: it enforces the same
//! short-code uniqueness constraint a production document store must carry,
//! so service tests exercise the real issuance retry path.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::record::{MappingField, MappingRecord};
use crate::store::{MappingStore, StoreError};

/// An in-memory [`MappingStore`] keyed by short code.
///
/// `insert` checks and writes under one lock, which makes the uniqueness
/// constraint atomic exactly like a unique index would: of two concurrent
/// inserts of the same code, one wins and the other observes
/// [`StoreError::DuplicateCode`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, MappingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored record, in no particular order.
    pub fn records(&self) -> Vec<MappingRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

impl MappingStore for MemoryStore {
    async fn insert(&self, record: &MappingRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.short_code) {
            return Err(StoreError::DuplicateCode {
                code: record.short_code.clone(),
            });
        }
        records.insert(record.short_code.clone(), record.clone());
        Ok(())
    }

    async fn find_one(
        &self,
        field: MappingField,
        value: &str,
    ) -> Result<Option<MappingRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .find(|r| field.value_of(r) == value)
            .cloned())
    }

    async fn find_many(
        &self,
        field: MappingField,
        values: &[String],
    ) -> Result<Vec<MappingRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| values.iter().any(|v| v == field.value_of(r)))
            .cloned()
            .collect())
    }

    async fn count(&self, field: MappingField, value: &str) -> Result<u64, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| field.value_of(r) == value)
            .count() as u64)
    }
}
