use crate::{
    error::{Error, Result, Tag},
    id::PawmarkId,
    status::IdGenStatus,
};

/// Common behavior of all generator flavors.
///
/// Implementations differ only in how they guard the mutable
/// (`last timestamp`, `sequence`) state across calls; the generation
/// algorithm itself is identical:
///
/// 1. Read the current time from the [`TimeSource`].
/// 2. If the clock reads *earlier* than the last generated millisecond, fail
///    with [`Error::ClockRegression`]. No retry, no wait: the generator is
///    unusable until the clock issue is resolved.
/// 3. If the clock reads the *same* millisecond, increment the sequence; if
///    the 12-bit sequence is exhausted, report [`IdGenStatus::Pending`].
/// 4. If the clock has *advanced*, reset the sequence to zero.
///
/// Within one instance, successive IDs are strictly non-decreasing. Across
/// instances there is no ordering or uniqueness guarantee unless each holds
/// a distinct (data-center tag, worker tag) pair.
///
/// [`TimeSource`]: crate::TimeSource
pub trait PawmarkGenerator {
    /// Attempts to generate the next available ID without blocking.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: a new ID is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: the sequence is exhausted
    ///   for the current millisecond; retry after `yield_for` ms
    /// - `Err(e)`: the clock regressed (or a lock was poisoned)
    fn try_poll_id(&self) -> Result<IdGenStatus>;

    /// Generates a new time-ordered ID, blocking through sequence
    /// exhaustion.
    ///
    /// Sequence overflow is absorbed by busy-polling the clock until the
    /// millisecond advances; the spin is bounded by the tick length (worst
    /// case under 1 ms) and never surfaces to the caller. A clock regression
    /// still propagates immediately.
    fn next_id(&self) -> Result<PawmarkId> {
        loop {
            match self.try_poll_id()? {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { .. } => core::hint::spin_loop(),
            }
        }
    }
}

/// Rejects tags that cannot be encoded in their 5-bit fields.
pub(crate) fn validate_tags(data_center_tag: u64, worker_tag: u64) -> Result<()> {
    if data_center_tag > PawmarkId::max_data_center_tag() {
        return Err(Error::TagOutOfRange {
            tag: Tag::DataCenter,
            value: data_center_tag,
            max: PawmarkId::max_data_center_tag(),
        });
    }
    if worker_tag > PawmarkId::max_worker_tag() {
        return Err(Error::TagOutOfRange {
            tag: Tag::Worker,
            value: worker_tag,
            max: PawmarkId::max_worker_tag(),
        });
    }
    Ok(())
}
