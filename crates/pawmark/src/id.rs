use core::fmt;

/// A 64-bit time-ordered identifier.
///
/// - 1 bit reserved (always 0)
/// - 41 bits timestamp (ms since [`PAWMARK_EPOCH`], or a configured epoch)
/// - 5 bits data-center tag
/// - 5 bits worker tag
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21       17 16       12 11             0
///              +--------------+----------------+-----------+-----------+---------------+
///  Field:      | reserved (1) | timestamp (41) | dc tag (5)| worker (5)| sequence (12) |
///              +--------------+----------------+-----------+-----------+---------------+
///              |<------------ MSB ----------- 64 bits ----------- LSB --------------->|
/// ```
///
/// The canonical external form is the plain decimal string of the packed
/// value (the [`fmt::Display`] impl); the surrounding application passes IDs
/// around as strings to avoid 53-bit precision loss in non-integer clients.
///
/// [`PAWMARK_EPOCH`]: crate::PAWMARK_EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PawmarkId {
    id: u64,
}

impl PawmarkId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit data-center tag. Occupies bits 17
    /// through 21.
    pub const DATA_CENTER_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit worker tag. Occupies bits 12 through
    /// 16.
    pub const WORKER_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit
    /// 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the data-center tag to its correct position
    /// (bit 17).
    pub const DATA_CENTER_SHIFT: u64 = 17;

    /// Number of bits to shift the worker tag to its correct position (bit
    /// 12).
    pub const WORKER_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    pub const fn from(timestamp: u64, data_center_tag: u64, worker_tag: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let data_center = (data_center_tag & Self::DATA_CENTER_MASK) << Self::DATA_CENTER_SHIFT;
        let worker = (worker_tag & Self::WORKER_MASK) << Self::WORKER_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | data_center | worker | sequence,
        }
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the data-center tag from the packed ID.
    pub const fn data_center_tag(&self) -> u64 {
        (self.id >> Self::DATA_CENTER_SHIFT) & Self::DATA_CENTER_MASK
    }

    /// Extracts the worker tag from the packed ID.
    pub const fn worker_tag(&self) -> u64 {
        (self.id >> Self::WORKER_SHIFT) & Self::WORKER_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum possible value for the timestamp field.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum possible value for the data-center tag.
    pub const fn max_data_center_tag() -> u64 {
        Self::DATA_CENTER_MASK
    }

    /// Returns the maximum possible value for the worker tag.
    pub const fn max_worker_tag() -> u64 {
        Self::WORKER_MASK
    }

    /// Returns the maximum possible value for the sequence field.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Constructs a new ID from its components, asserting field bounds in
    /// debug builds.
    pub fn from_components(
        timestamp: u64,
        data_center_tag: u64,
        worker_tag: u64,
        sequence: u64,
    ) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(
            data_center_tag <= Self::DATA_CENTER_MASK,
            "data_center_tag overflow"
        );
        debug_assert!(worker_tag <= Self::WORKER_MASK, "worker_tag overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, data_center_tag, worker_tag, sequence)
    }

    /// Converts this ID into its raw `u64` representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Converts a raw `u64` into an ID.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns true if the current sequence value can be incremented.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented.
    pub fn increment_sequence(&self) -> Self {
        Self::from_components(
            self.timestamp(),
            self.data_center_tag(),
            self.worker_tag(),
            self.sequence() + 1,
        )
    }

    /// Returns a new ID for a newer timestamp with sequence reset to zero.
    pub fn rollover_to_timestamp(&self, ts: u64) -> Self {
        Self::from_components(ts, self.data_center_tag(), self.worker_tag(), 0)
    }
}

impl fmt::Display for PawmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for PawmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PawmarkId")
            .field("raw", &self.id)
            .field("timestamp", &self.timestamp())
            .field("data_center_tag", &self.data_center_tag())
            .field("worker_tag", &self.worker_tag())
            .field("sequence", &self.sequence())
            .finish()
    }
}
