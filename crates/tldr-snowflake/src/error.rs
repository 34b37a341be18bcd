/// A result type whose error defaults to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `tldr-snowflake` can emit.
///
/// ID generation itself is infallible. Errors only surface when a generator
/// is constructed with an out-of-range node identifier or on a host whose
/// clock has not reached the epoch, or when a decimal string fails to parse
/// back into a [`SnowflakeId`].
///
/// [`SnowflakeId`]: crate::SnowflakeId
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The node identifier does not fit in the 10-bit node field.
    #[error("node identifier {node_id} is out of range, expected a value between 0 and {max}")]
    InvalidNodeIdentifier {
        /// The rejected value, as supplied by the caller.
        node_id: i64,
        /// The largest accepted node identifier.
        max: u64,
    },

    /// The system clock reads a time at or before the generator epoch.
    #[error(
        "system clock reads {now_ms} ms since the Unix epoch, which is not after the generator epoch at {epoch_ms} ms"
    )]
    ClockBeforeEpoch {
        /// The system clock reading, in milliseconds since the Unix epoch.
        now_ms: u64,
        /// The configured epoch, in milliseconds since the Unix epoch.
        epoch_ms: u64,
    },

    /// The input is not the decimal rendering of a snowflake ID.
    #[error("invalid snowflake id {input:?}: {reason}")]
    InvalidId {
        /// The rejected input.
        input: String,
        /// What was wrong with it.
        reason: IdParseReason,
    },
}

/// Why a string could not be parsed into a [`SnowflakeId`].
///
/// [`SnowflakeId`]: crate::SnowflakeId
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum IdParseReason {
    /// The string was empty.
    #[error("empty input")]
    Empty,

    /// A character other than `0`-`9` was found.
    #[error("unexpected character {0:?}")]
    InvalidDigit(char),

    /// The value does not fit in 63 bits.
    #[error("value exceeds the 63-bit id range")]
    Overflow,
}
