use crate::id::PawmarkId;

/// Represents the result of polling a generator for a new ID.
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the per-millisecond sequence is exhausted
///   and no ID can be produced until the clock advances by `yield_for`
///   milliseconds.
///
/// This allows non-blocking generation loops and clean backoff strategies.
/// The blocking `next_id` methods spin through `Pending` internally, so
/// callers only meet this type via `try_poll_id`.
///
/// # Example
///
/// ```
/// use pawmark::{BasicPawmarkGenerator, IdGenStatus, PawmarkGenerator, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = BasicPawmarkGenerator::new(0, 0, FixedTime).unwrap();
/// match generator.try_poll_id().unwrap() {
///     IdGenStatus::Ready { id } => println!("ID: {id}"),
///     IdGenStatus::Pending { yield_for } => println!("back off for: {yield_for} ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: PawmarkId,
    },
    /// No ID could be generated because the sequence has been exhausted for
    /// the current millisecond.
    Pending {
        /// How many milliseconds the clock must advance before generation
        /// can resume.
        yield_for: u64,
    },
}
