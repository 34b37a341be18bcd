use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Result,
    generator::{SnowflakeGenerator, checked_node_id, wait_for_clock, wait_past},
    id::SnowflakeId,
    time::{TimeSource, WallClock},
};

/// A lock-free Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// This generator stores the last issued ID in an [`AtomicU64`] and advances
/// it with a compare-and-swap loop. No lock is held while waiting for the
/// clock, so a caller spinning on an exhausted millisecond does not block
/// callers that observe a newer one.
///
/// ## Features
/// - ✅ Thread-safe
/// - ❌ Fair: a caller can lose the CAS race repeatedly under contention
///
/// ## Recommended When
/// - Throughput matters more than fair access
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::generator::LockSnowflakeGenerator
pub struct AtomicSnowflakeGenerator<T = WallClock>
where
    T: TimeSource,
{
    state: AtomicU64,
    node_id: u16,
    time: T,
}

impl AtomicSnowflakeGenerator {
    /// Creates a generator for `node_id` that reads the system wall clock
    /// relative to [`TLDR_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentifier`] if `node_id` is outside
    /// `0..=1023`, or [`Error::ClockBeforeEpoch`] if the system clock has
    /// not reached [`TLDR_EPOCH`].
    ///
    /// # Example
    /// ```
    /// use tldr_snowflake::AtomicSnowflakeGenerator;
    ///
    /// let generator = AtomicSnowflakeGenerator::new(0).unwrap();
    /// let a = generator.generate();
    /// let b = generator.generate();
    /// assert!(a < b);
    /// ```
    ///
    /// [`TLDR_EPOCH`]: crate::TLDR_EPOCH
    /// [`Error::InvalidNodeIdentifier`]: crate::Error::InvalidNodeIdentifier
    /// [`Error::ClockBeforeEpoch`]: crate::Error::ClockBeforeEpoch
    pub fn new(node_id: i64) -> Result<Self> {
        let node_id = checked_node_id(node_id)?;
        Ok(Self::from_components(0, node_id, 0, WallClock::new()?))
    }
}

impl<T> AtomicSnowflakeGenerator<T>
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
        let id = SnowflakeId::from_components(timestamp, u64::from(node_id), sequence);
        Self {
            state: AtomicU64::new(id.to_raw()),
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
    /// Observable behavior matches [`LockSnowflakeGenerator::generate`]. A
    /// lost CAS race or an exhausted sequence simply retries against the
    /// freshly loaded state.
    ///
    /// [`LockSnowflakeGenerator::generate`]: crate::generator::LockSnowflakeGenerator::generate
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> SnowflakeId {
        let node_id = u64::from(self.node_id);

        loop {
            let current_raw = self.state.load(Ordering::Acquire);
            let current = SnowflakeId::from_raw(current_raw);
            let current_ts = current.timestamp();

            // Readings at or before the epoch count as behind.
            let floor = current_ts.max(1);
            let mut now = self.time.current_millis();
            if now < floor {
                now = wait_for_clock(&self.time, now, floor);
            }

            let next = if now == current_ts {
                let sequence = current.sequence();
                if sequence == SnowflakeId::SEQUENCE_MASK {
                    wait_past(&self.time, current_ts);
                    continue;
                }
                SnowflakeId::from_components(now, node_id, sequence + 1)
            } else {
                SnowflakeId::from_components(now, node_id, 0)
            };

            if self
                .state
                .compare_exchange(
                    current_raw,
                    next.to_raw(),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                break next;
            }

            // CAS failed - another thread won the race. Retry immediately.
            core::hint::spin_loop();
        }
    }
}

impl<T> SnowflakeGenerator for AtomicSnowflakeGenerator<T>
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
