use core::{cell::Cell, cmp::Ordering};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::{PawmarkGenerator, validate_tags},
    id::PawmarkId,
    status::IdGenStatus,
    time::TimeSource,
};

/// A non-concurrent ID generator suitable for single-threaded environments.
///
/// This generator is lightweight and fast, but **not thread-safe**: the
/// (`last timestamp`, `sequence`) state lives in a [`Cell`] and is mutated
/// on every call without synchronization. Dedicate one instance per
/// execution thread, or use one of the shared flavors.
///
/// ## Recommended When
/// - You're in a single-threaded environment (no shared access)
/// - You want the fastest generator
///
/// ## See Also
/// - [`LockPawmarkGenerator`]
/// - [`AtomicPawmarkGenerator`]
///
/// [`LockPawmarkGenerator`]: crate::LockPawmarkGenerator
/// [`AtomicPawmarkGenerator`]: crate::AtomicPawmarkGenerator
#[derive(Debug)]
pub struct BasicPawmarkGenerator<T>
where
    T: TimeSource,
{
    state: Cell<PawmarkId>,
    time: T,
}

impl<T> BasicPawmarkGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for the given tag pair.
    ///
    /// The initial timestamp and sequence are zero; the first call rolls
    /// over to the current time. Both tags are validated against their
    /// 5-bit fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TagOutOfRange`] if either tag exceeds 31.
    ///
    /// # Example
    /// ```
    /// use pawmark::{BasicPawmarkGenerator, MonotonicClock, PawmarkGenerator};
    ///
    /// let generator = BasicPawmarkGenerator::new(1, 1, MonotonicClock::default()).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.data_center_tag(), 1);
    /// ```
    pub fn new(data_center_tag: u64, worker_tag: u64, time: T) -> Result<Self> {
        Self::from_components(0, data_center_tag, worker_tag, 0, time)
    }

    /// Creates a generator from explicit component values.
    ///
    /// Primarily useful for restoring state or pinning the starting point
    /// in tests. Prefer [`Self::new`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TagOutOfRange`] if either tag exceeds 31.
    pub fn from_components(
        timestamp: u64,
        data_center_tag: u64,
        worker_tag: u64,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        validate_tags(data_center_tag, worker_tag)?;
        let id = PawmarkId::from_components(timestamp, data_center_tag, worker_tag, sequence);
        Ok(Self {
            state: Cell::new(id),
            time,
        })
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn poll(&self) -> Result<IdGenStatus> {
        let now = self.time.current_millis();
        let state = self.state.get();
        let current_ts = state.timestamp();

        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if state.has_sequence_room() {
                    let updated = state.increment_sequence();
                    self.state.set(updated);
                    Ok(IdGenStatus::Ready { id: updated })
                } else {
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                let updated = state.rollover_to_timestamp(now);
                self.state.set(updated);
                Ok(IdGenStatus::Ready { id: updated })
            }
            Ordering::Less => Err(cold_clock_regression(now, current_ts)),
        }
    }
}

#[cold]
#[inline(never)]
pub(crate) fn cold_clock_regression(now: u64, last: u64) -> Error {
    Error::ClockRegression { last, now }
}

impl<T> PawmarkGenerator for BasicPawmarkGenerator<T>
where
    T: TimeSource,
{
    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.poll()
    }
}
