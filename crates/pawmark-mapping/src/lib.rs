//! Short-code issuance and lookup for the PetMeet backend.
//!
//! This crate turns "give this owner a public code" into a durable, unique
//! mapping between a 9-digit [`ShortCode`] and the internal 64-bit
//! [`PawmarkId`], and serves lookups in both directions:
//!
//! - [`IdMappingService`] — the orchestrator: issue, resolve, batch-resolve,
//!   existence checks.
//! - [`MappingStore`] — the interface of the external persistent store
//!   (a document database in production, [`testkit::MemoryStore`] in tests).
//!   The store's uniqueness constraint on inserts is the *only* collision
//!   signal; there is no check-then-insert read race.
//! - [`MappingRecord`] — the persisted `{shortCode, originalId, ownerId,
//!   createdAt}` document. One record per issued code, created once, never
//!   mutated.
//!
//! Issuance reports durability explicitly: a store outage after the
//! identifier was generated yields a degraded success
//! ([`Durability::Degraded`]) carrying the code and ID, so the caller can
//! retry persistence instead of silently trusting an unpersisted code.
//!
//! [`ShortCode`]: pawmark::ShortCode
//! [`PawmarkId`]: pawmark::PawmarkId

mod config;
mod error;
mod record;
mod service;
mod store;
pub mod testkit;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::record::*;
pub use crate::service::*;
pub use crate::store::*;
