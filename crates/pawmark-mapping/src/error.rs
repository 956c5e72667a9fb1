use crate::store::StoreError;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the mapping service.
///
/// `NotFound` is deliberately absent: resolve operations return `Ok(None)`
/// and batch operations omit misses, since an unknown code is an answer,
/// not a failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying ID generation failed (clock regression, bad tags).
    #[error("id generation failed: {0}")]
    IdGeneration(#[from] pawmark::Error),

    /// Every candidate code in the retry budget was already taken.
    #[error("no unique short code found after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    /// The store reported a failure during a lookup.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A store call exceeded the configured time bound.
    #[error("mapping store call timed out after {timeout_ms} ms")]
    StoreTimeout { timeout_ms: u64 },
}
