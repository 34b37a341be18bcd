use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Custom epoch: Wednesday, January 1, 2020 00:00:00 UTC
pub const TLDR_EPOCH: Duration = Duration::from_millis(1_577_836_800_000);

/// A trait for time sources that return a millisecond timestamp.
///
/// This abstraction allows you to plug in the system wall clock or a mocked
/// time source in tests. The unit is **milliseconds** relative to the clock's
/// own origin, which becomes the timestamp field of every generated ID.
///
/// # Example
///
/// ```
/// use tldr_snowflake::TimeSource;
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

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// A time source backed by [`SystemTime`], re-read on every call.
///
/// The wall clock can be stepped backwards by NTP or an operator. Generators
/// detect this and wait for the clock to catch up, so a regression never
/// produces an out-of-order ID.
///
/// A clock is only handed out when the system time is already past its epoch.
/// A host that boots with an unset RTC (reading 1970) is rejected up front
/// instead of issuing IDs from a timestamp that never advances. Readings that
/// later fall before the epoch saturate to zero, which generators treat as a
/// clock regression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallClock {
    epoch: u64, // in milliseconds since the Unix epoch
}

impl WallClock {
    /// Constructs a wall clock aligned to [`TLDR_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockBeforeEpoch`] if the system clock does not read
    /// a time after 2020-01-01 UTC.
    pub fn new() -> Result<Self> {
        Self::with_epoch(TLDR_EPOCH)
    }

    /// Constructs a wall clock using `epoch`, given as a [`Duration`] since
    /// 1970-01-01 UTC, as the origin (t = 0).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockBeforeEpoch`] if the system clock does not read
    /// a time after `epoch`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use tldr_snowflake::{TimeSource, WallClock};
    ///
    /// let unix = WallClock::with_epoch(Duration::ZERO).unwrap();
    /// let custom = WallClock::new().unwrap();
    /// assert!(unix.current_millis() > custom.current_millis());
    ///
    /// let far_future = Duration::from_secs(u64::from(u32::MAX) * 1000);
    /// assert!(WallClock::with_epoch(far_future).is_err());
    /// ```
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_epoch(epoch: Duration) -> Result<Self> {
        let epoch = epoch.as_millis() as u64;
        let now = unix_millis();
        if now <= epoch {
            return Err(Error::ClockBeforeEpoch {
                now_ms: now,
                epoch_ms: epoch,
            });
        }
        Ok(Self { epoch })
    }

    /// The configured origin, in milliseconds since the Unix epoch.
    pub const fn epoch_millis(&self) -> u64 {
        self.epoch
    }
}

impl TimeSource for WallClock {
    fn current_millis(&self) -> u64 {
        unix_millis().saturating_sub(self.epoch)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
