use core::future::Future;
use std::sync::Arc;

use crate::record::{MappingField, MappingRecord};

/// Errors a [`MappingStore`] implementation can report.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The uniqueness constraint on `shortCode` rejected an insert.
    ///
    /// This is the issuance retry loop's collision signal.
    #[error("a mapping already exists for short code {code}")]
    DuplicateCode { code: String },

    /// The store could not be reached or the operation failed.
    #[error("mapping store unavailable: {context}")]
    Unavailable { context: String },
}

/// The persistent store holding the short-code/ID bijection.
///
/// Implemented outside this crate by whatever document database the
/// deployment uses; [`testkit::MemoryStore`] is the in-process reference
/// implementation. Every method is a suspension point.
///
/// ## Contract
///
/// - `insert` MUST enforce uniqueness of `shortCode` atomically and fail
///   with [`StoreError::DuplicateCode`] on violation. Issuance relies on
///   this as its only collision check: two concurrent issuances of the
///   same candidate must never both succeed, which a separate
///   read-then-write cannot guarantee.
/// - Lookups are plain equality (or membership) queries on the indexed
///   fields; a miss is an empty result, not an error.
///
/// [`testkit::MemoryStore`]: crate::testkit::MemoryStore
pub trait MappingStore: Send + Sync {
    /// Persists a new record, failing on a duplicate short code.
    fn insert(
        &self,
        record: &MappingRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the record whose `field` equals `value`, if any.
    fn find_one(
        &self,
        field: MappingField,
        value: &str,
    ) -> impl Future<Output = Result<Option<MappingRecord>, StoreError>> + Send;

    /// Returns every record whose `field` is contained in `values`.
    fn find_many(
        &self,
        field: MappingField,
        values: &[String],
    ) -> impl Future<Output = Result<Vec<MappingRecord>, StoreError>> + Send;

    /// Counts records whose `field` equals `value`.
    fn count(
        &self,
        field: MappingField,
        value: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

// A shared handle to a store is itself a store.
impl<S: MappingStore> MappingStore for Arc<S> {
    fn insert(&self, record: &MappingRecord) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert(record)
    }

    fn find_one(
        &self,
        field: MappingField,
        value: &str,
    ) -> impl Future<Output = Result<Option<MappingRecord>, StoreError>> + Send {
        (**self).find_one(field, value)
    }

    fn find_many(
        &self,
        field: MappingField,
        values: &[String],
    ) -> impl Future<Output = Result<Vec<MappingRecord>, StoreError>> + Send {
        (**self).find_many(field, values)
    }

    fn count(
        &self,
        field: MappingField,
        value: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send {
        (**self).count(field, value)
    }
}
