//! Time-ordered 64-bit identifiers and 9-digit public short codes.
//!
//! This crate is the identifier core of the PetMeet backend. It provides:
//!
//! - [`PawmarkId`] — a bit-packed 64-bit ID carrying a millisecond timestamp,
//!   a data-center tag, a worker tag, and a per-millisecond sequence.
//! - Generators in three flavors ([`BasicPawmarkGenerator`],
//!   [`LockPawmarkGenerator`], [`AtomicPawmarkGenerator`]) over a pluggable
//!   [`TimeSource`].
//! - [`ShortCode`] — the 9-digit decimal code shown to end users in place of
//!   the internal ID, derived deterministically from a [`PawmarkId`].
//!
//! Uniqueness across a fleet relies on every live generator holding a
//! distinct (data-center tag, worker tag) pair. That assignment is static
//! deployment configuration; nothing in this crate coordinates it.

mod error;
mod generator;
mod id;
mod mutex;
mod shortcode;
mod status;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::shortcode::*;
pub use crate::status::*;
pub use crate::time::*;
