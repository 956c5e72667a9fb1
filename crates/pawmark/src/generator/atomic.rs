use core::cmp::Ordering as CmpOrdering;

use portable_atomic::{AtomicU64, Ordering};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::Result,
    generator::{PawmarkGenerator, basic::cold_clock_regression, validate_tags},
    id::PawmarkId,
    status::IdGenStatus,
    time::TimeSource,
};

/// A lock-free ID generator suitable for multi-threaded environments.
///
/// The packed ID doubles as the generator state inside an [`AtomicU64`]:
/// each call computes the successor value and publishes it with a single
/// compare-and-swap. A lost race reports [`IdGenStatus::Pending`] with
/// `yield_for: 0`, meaning "retry immediately" — the blocking `next_id`
/// loop does exactly that.
///
/// ## Recommended When
/// - Multiple threads share one generator under light-to-moderate
///   contention
/// - You want to avoid a mutex on the hot path
///
/// ## See Also
/// - [`BasicPawmarkGenerator`]
/// - [`LockPawmarkGenerator`]
///
/// [`BasicPawmarkGenerator`]: crate::BasicPawmarkGenerator
/// [`LockPawmarkGenerator`]: crate::LockPawmarkGenerator
pub struct AtomicPawmarkGenerator<T>
where
    T: TimeSource,
{
    state: AtomicU64,
    data_center_tag: u64,
    worker_tag: u64,
    time: T,
}

impl<T> AtomicPawmarkGenerator<T>
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
    /// use pawmark::{AtomicPawmarkGenerator, MonotonicClock, PawmarkGenerator};
    ///
    /// let generator = AtomicPawmarkGenerator::new(2, 5, MonotonicClock::default()).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.sequence(), 0);
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
        let initial = PawmarkId::from_components(timestamp, data_center_tag, worker_tag, sequence);
        Ok(Self {
            state: AtomicU64::new(initial.to_raw()),
            data_center_tag,
            worker_tag,
            time,
        })
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn poll(&self) -> Result<IdGenStatus> {
        let now = self.time.current_millis();

        let current_raw = self.state.load(Ordering::Relaxed);
        let current_id = PawmarkId::from_raw(current_raw);
        let current_ts = current_id.timestamp();

        let (next_ts, next_seq) = match now.cmp(&current_ts) {
            CmpOrdering::Less => return Err(cold_clock_regression(now, current_ts)),
            CmpOrdering::Greater => (now, 0),
            CmpOrdering::Equal => {
                if current_id.has_sequence_room() {
                    (current_ts, current_id.sequence() + 1)
                } else {
                    return Ok(IdGenStatus::Pending { yield_for: 1 });
                }
            }
        };

        let next_id =
            PawmarkId::from_components(next_ts, self.data_center_tag, self.worker_tag, next_seq);

        if self
            .state
            .compare_exchange(
                current_raw,
                next_id.to_raw(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Ok(IdGenStatus::Ready { id: next_id })
        } else {
            // CAS failed: another thread won the race. Yield 0 to retry
            // immediately.
            Ok(IdGenStatus::Pending { yield_for: 0 })
        }
    }
}

impl<T> PawmarkGenerator for AtomicPawmarkGenerator<T>
where
    T: TimeSource,
{
    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.poll()
    }
}
