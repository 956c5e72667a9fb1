use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// Default epoch: Sunday, January 1, 2023 00:00:00 UTC.
///
/// All timestamps embedded in a [`PawmarkId`] are offsets from this origin
/// unless a deployment overrides it. The 41-bit timestamp field lasts about
/// 69 years from here.
///
/// [`PawmarkId`]: crate::PawmarkId
pub const PAWMARK_EPOCH: Duration = Duration::from_millis(1_672_531_200_000);

/// A trait for time sources that return the current time in milliseconds
/// since a configured epoch.
///
/// This abstraction allows plugging in a wall clock, a monotonic timer, or a
/// mocked time source in tests.
///
/// # Example
///
/// ```
/// use pawmark::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

/// A wall-clock time source reading [`SystemTime`] on every call.
///
/// This matches what the surrounding application observes as "now", but the
/// operating system may step the clock backwards (NTP correction, manual
/// adjustment). Generators fed by this source surface such a step as
/// [`Error::ClockRegression`]. Prefer [`MonotonicClock`] where that failure
/// mode is unacceptable.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch_millis: u64,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_epoch(PAWMARK_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a wall clock anchored to `epoch`, given as a [`Duration`]
    /// since 1970-01-01 UTC.
    pub fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: epoch.as_millis() as u64,
        }
    }
}

impl TimeSource for SystemClock {
    /// Returns wall-clock milliseconds since the configured epoch.
    ///
    /// Saturates to zero if the system clock reads earlier than the epoch.
    fn current_millis(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        now.saturating_sub(self.epoch_millis)
    }
}

/// Shared ticker thread that updates every millisecond.
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source that returns elapsed time since process start,
/// offset from a user-defined epoch.
///
/// This avoids wall-clock adjustments (e.g., NTP or daylight savings changes)
/// while still aligning timestamps to a fixed origin, so generators fed by it
/// can never observe a clock regression.
///
/// Internally, the clock spawns a background thread that updates a shared
/// atomic counter once per millisecond using a monotonic timer ([`Instant`]).
/// Reads on the hot path are a single relaxed atomic load plus a fixed
/// offset. The ticker thread exits once the last clone of the clock is
/// dropped.
#[derive(Clone)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    epoch_offset: u64, // in milliseconds
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to [`PAWMARK_EPOCH`].
    ///
    /// Panics if system time is earlier than that epoch.
    fn default() -> Self {
        Self::with_epoch(PAWMARK_EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock using a custom epoch as the origin
    /// (t = 0), specified as a [`Duration`] since the Unix epoch.
    ///
    /// On each call to [`current_millis`], the clock returns the current tick
    /// value plus a fixed offset - the precomputed difference between the
    /// wall-clock time at construction and the given epoch.
    ///
    /// # Panics
    ///
    /// Panics if the current system time is earlier than the given epoch.
    ///
    /// [`current_millis`]: TimeSource::current_millis
    pub fn with_epoch(epoch: Duration) -> Self {
        let start = Instant::now();
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System clock before UNIX_EPOCH");
        let offset = system_now
            .checked_sub(epoch)
            .expect("System clock before configured epoch")
            .as_millis() as u64;

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Compute the absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                // Sleep if we are early
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                // After waking, recompute how far we actually are from the
                // start
                let now_ms = start.elapsed().as_millis() as u64;

                // Monotonic store, aligned to elapsed milliseconds since
                // start
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                // Align to next tick after the current actual time
                tick = now_ms + 1;
            }
        });

        inner
            ._handle
            .set(handle)
            .expect("failed to set thread handle");

        Self {
            inner,
            epoch_offset: offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the number of milliseconds since the configured epoch, based
    /// on the elapsed monotonic time since construction.
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.inner.current.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_decreases() {
        let clock = MonotonicClock::default();
        let mut last = clock.current_millis();
        for _ in 0..1000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn system_clock_tracks_epoch_offset() {
        let unix = SystemClock::with_epoch(Duration::from_millis(0));
        let anchored = SystemClock::default();
        let delta = unix.current_millis() - anchored.current_millis();
        let epoch = PAWMARK_EPOCH.as_millis() as u64;
        // Both reads happen microseconds apart; allow a small skew.
        assert!(delta.abs_diff(epoch) < 100);
    }
}
