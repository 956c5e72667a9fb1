use core::fmt;

/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All possible errors that `pawmark` can produce.
///
/// Generation is nearly infallible: sequence exhaustion is absorbed by a
/// bounded spin inside the generators and never surfaces. What remains is a
/// clock that moved backwards, invalid construction input, and lock
/// poisoning.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The time source reported an earlier millisecond than the one the last
    /// ID was generated in.
    ///
    /// This is fatal for the affected call: the generator refuses to produce
    /// IDs that would break time ordering and does not wait for the clock to
    /// catch up. The operator must resolve the clock issue (or switch to
    /// [`MonotonicClock`], which cannot regress).
    ///
    /// [`MonotonicClock`]: crate::MonotonicClock
    ClockRegression {
        /// Timestamp (ms since epoch) of the most recently generated ID.
        last: u64,
        /// Timestamp (ms since epoch) the time source just reported.
        now: u64,
    },

    /// A data-center or worker tag was outside the encodable range.
    ///
    /// Both tag fields are 5 bits wide, so valid values are `0..=31`.
    TagOutOfRange {
        /// Which tag field was rejected.
        tag: Tag,
        /// The rejected value.
        value: u64,
        /// The largest encodable value for that field.
        max: u64,
    },

    /// The operation failed due to a poisoned lock.
    ///
    /// This can happen if another thread panicked while holding the shared
    /// generator state. Not produced when the `parking-lot` feature is
    /// enabled.
    LockPoisoned,
}

/// The tag field named by [`Error::TagOutOfRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    DataCenter,
    Worker,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockRegression { last, now } => write!(
                f,
                "clock moved backwards: refusing to generate id ({} ms behind)",
                last - now
            ),
            Self::TagOutOfRange { tag, value, max } => {
                let name = match tag {
                    Tag::DataCenter => "data-center tag",
                    Tag::Worker => "worker tag",
                };
                write!(f, "{name} {value} out of range (0..={max})")
            }
            Self::LockPoisoned => write!(f, "generator lock poisoned"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(not(feature = "parking-lot"))]
// Collapse poisoned lock errors from the std mutex to `LockPoisoned`.
impl<T> From<std::sync::PoisonError<std::sync::MutexGuard<'_, T>>> for Error {
    fn from(_: std::sync::PoisonError<std::sync::MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
