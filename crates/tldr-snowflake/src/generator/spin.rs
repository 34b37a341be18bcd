#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::{Error, Result, id::SnowflakeId, time::TimeSource};

/// Largest node identifier accepted by a generator.
pub const MAX_NODE_ID: u16 = SnowflakeId::NODE_ID_MASK as u16;

/// Checks that `node_id` fits in the 10-bit node field.
///
/// Generator constructors run this check; it is exposed so configuration
/// layers can reject a bad node identifier with the same bound and message.
///
/// # Errors
///
/// Returns [`Error::InvalidNodeIdentifier`] if `node_id` is outside
/// `0..=1023`.
///
/// # Example
/// ```
/// use tldr_snowflake::checked_node_id;
///
/// assert_eq!(checked_node_id(1023), Ok(1023));
/// assert!(checked_node_id(-1).is_err());
/// ```
pub fn checked_node_id(node_id: i64) -> Result<u16> {
    u16::try_from(node_id)
        .ok()
        .filter(|id| *id <= MAX_NODE_ID)
        .ok_or(Error::InvalidNodeIdentifier {
            node_id,
            max: u64::from(MAX_NODE_ID),
        })
}

/// Busy-waits until the clock moves strictly past `last_ts` and returns the
/// new reading. Called when the sequence for `last_ts` is exhausted.
#[cold]
#[inline(never)]
pub(crate) fn wait_past<T: TimeSource>(time: &T, last_ts: u64) -> u64 {
    #[cfg(feature = "tracing")]
    debug!(last_ts, "sequence exhausted, waiting for next millisecond");

    loop {
        let now = time.current_millis();
        if now > last_ts {
            break now;
        }
        core::hint::spin_loop();
    }
}

/// Busy-waits until the clock reaches `floor` and returns the new reading,
/// which is `>= floor`. Called after a regression, or while the clock still
/// reads the epoch itself.
#[cold]
#[inline(never)]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) fn wait_for_clock<T: TimeSource>(time: &T, now: u64, floor: u64) -> u64 {
    #[cfg(feature = "tracing")]
    warn!(
        now,
        floor,
        behind_ms = floor - now,
        "clock is behind the last issued timestamp, waiting for it to catch up"
    );

    loop {
        let now = time.current_millis();
        if now >= floor {
            break now;
        }
        core::hint::spin_loop();
    }
}
