use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Result,
    generator::{SnowflakeGenerator, checked_node_id, wait_for_clock, wait_past},
    id::SnowflakeId,
    time::{TimeSource, WallClock},
};

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID is kept behind a single [`Mutex`] that covers the whole
/// read-modify-write of [`generate`]. When the 4096 IDs of a millisecond are
/// used up, the caller holding the lock spins until the clock advances, so
/// every other caller is serialized behind it.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Fair: callers are served one at a time
///
/// ## Recommended When
/// - You want one generator per process shared by every request path
/// - Sustained bursts above 4096 IDs per millisecond are rare
///
/// ## See Also
/// - [`AtomicSnowflakeGenerator`]
///
/// [`generate`]: Self::generate
/// [`AtomicSnowflakeGenerator`]: crate::generator::AtomicSnowflakeGenerator
pub struct LockSnowflakeGenerator<T = WallClock>
where
    T: TimeSource,
{
    state: Mutex<SnowflakeId>,
    node_id: u16,
    time: T,
}

impl LockSnowflakeGenerator {
    /// Creates a generator for `node_id` that reads the system wall clock
    /// relative to [`TLDR_EPOCH`].
    ///
    /// The last timestamp and sequence start at zero. The clock is read once
    /// here to check that it is past the epoch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentifier`] if `node_id` is outside
    /// `0..=1023`, or [`Error::ClockBeforeEpoch`] if the system clock has
    /// not reached [`TLDR_EPOCH`].
    ///
    /// # Example
    /// ```
    /// use tldr_snowflake::LockSnowflakeGenerator;
    ///
    /// let generator = LockSnowflakeGenerator::new(7).unwrap();
    /// let a = generator.generate();
    /// let b = generator.generate();
    /// assert!(a < b);
    ///
    /// assert!(LockSnowflakeGenerator::new(1024).is_err());
    /// ```
    ///
    /// [`TLDR_EPOCH`]: crate::TLDR_EPOCH
    /// [`Error::InvalidNodeIdentifier`]: crate::Error::InvalidNodeIdentifier
    /// [`Error::ClockBeforeEpoch`]: crate::Error::ClockBeforeEpoch
    /// [`generate`]: Self::generate
    pub fn new(node_id: i64) -> Result<Self> {
        let node_id = checked_node_id(node_id)?;
        Ok(Self::from_components(0, node_id, 0, WallClock::new()?))
    }
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for `node_id` that reads timestamps from `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentifier`] if `node_id` is outside
    /// `0..=1023`.
    ///
    /// [`Error::InvalidNodeIdentifier`]: crate::Error::InvalidNodeIdentifier
    pub fn with_clock(node_id: i64, time: T) -> Result<Self> {
        let node_id = checked_node_id(node_id)?;
        Ok(Self::from_components(0, node_id, 0, time))
    }

    pub(crate) fn from_components(timestamp: u64, node_id: u16, sequence: u64, time: T) -> Self {
        Self {
            state: Mutex::new(SnowflakeId::from_components(
                timestamp,
                u64::from(node_id),
                sequence,
            )),
            node_id,
            time,
        }
    }

    /// The node identifier embedded in every ID.
    pub const fn node_id(&self) -> u16 {
        self.node_id
    }

    /// Generates the next ID.
    ///
    /// If the clock has not moved since the last ID, the sequence is bumped.
    /// When it wraps past 4095 the lock is held while spinning on the clock
    /// until the next millisecond, which then starts again at sequence 0. If
    /// the clock has moved backwards, or still reads the epoch, the call spins
    /// until it catches up.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> SnowflakeId {
        let mut last = self.state.lock();
        let last_ts = last.timestamp();

        // Readings at or before the epoch count as behind.
        let floor = last_ts.max(1);
        let mut now = self.time.current_millis();
        if now < floor {
            now = wait_for_clock(&self.time, now, floor);
        }

        let sequence = if now == last_ts {
            let sequence = (last.sequence() + 1) & SnowflakeId::SEQUENCE_MASK;
            if sequence == 0 {
                now = wait_past(&self.time, last_ts);
            }
            sequence
        } else {
            0
        };

        let next = SnowflakeId::from_components(now, u64::from(self.node_id), sequence);
        *last = next;
        next
    }
}

impl<T> SnowflakeGenerator for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn node_id(&self) -> u16 {
        self.node_id()
    }

    fn generate(&self) -> SnowflakeId {
        self.generate()
    }
}
