use core::cmp::Ordering;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::Result,
    generator::{PawmarkGenerator, basic::cold_clock_regression, validate_tags},
    id::PawmarkId,
    mutex::{Mutex, MutexGuard},
    status::IdGenStatus,
    time::TimeSource,
};

/// A lock-based ID generator suitable for multi-threaded environments.
///
/// The (`last timestamp`, `sequence`) state lives behind an
/// [`Arc<Mutex<_>>`], so clones share one sequence space and the generator
/// can be handed to async tasks or threads freely. With the `parking-lot`
/// feature the std mutex is swapped for `parking_lot::Mutex`, which cannot
/// poison.
///
/// ## Recommended When
/// - Multiple threads or tasks share one generator instance
/// - You want the simplest correct shared flavor (the mapping service uses
///   this one)
///
/// ## See Also
/// - [`BasicPawmarkGenerator`]
/// - [`AtomicPawmarkGenerator`]
///
/// [`BasicPawmarkGenerator`]: crate::BasicPawmarkGenerator
/// [`AtomicPawmarkGenerator`]: crate::AtomicPawmarkGenerator
#[derive(Clone, Debug)]
pub struct LockPawmarkGenerator<T>
where
    T: TimeSource,
{
    state: Arc<Mutex<PawmarkId>>,
    time: T,
}

impl<T> LockPawmarkGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for the given tag pair.
    ///
    /// The initial timestamp and sequence are zero; the first call rolls
    /// over to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TagOutOfRange`] if either tag exceeds 31.
    ///
    /// # Example
    /// ```
    /// use pawmark::{LockPawmarkGenerator, MonotonicClock, PawmarkGenerator};
    ///
    /// let generator = LockPawmarkGenerator::new(0, 3, MonotonicClock::default()).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.worker_tag(), 3);
    /// ```
    ///
    /// [`Error::TagOutOfRange`]: crate::Error::TagOutOfRange
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
    ///
    /// [`Error::TagOutOfRange`]: crate::Error::TagOutOfRange
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
            state: Arc::new(Mutex::new(id)),
            time,
        })
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, PawmarkId>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            self.state.lock().map_err(crate::error::Error::from)
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn poll(&self) -> Result<IdGenStatus> {
        let mut state = self.lock_state()?;
        let now = self.time.current_millis();
        let current_ts = state.timestamp();

        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if state.has_sequence_room() {
                    let updated = state.increment_sequence();
                    *state = updated;
                    Ok(IdGenStatus::Ready { id: updated })
                } else {
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                let updated = state.rollover_to_timestamp(now);
                *state = updated;
                Ok(IdGenStatus::Ready { id: updated })
            }
            Ordering::Less => Err(cold_clock_regression(now, current_ts)),
        }
    }
}

impl<T> PawmarkGenerator for LockPawmarkGenerator<T>
where
    T: TimeSource,
{
    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.poll()
    }
}
