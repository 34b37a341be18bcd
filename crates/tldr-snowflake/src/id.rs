use core::{fmt, str::FromStr};

use crate::{Error, IdParseReason};

/// A 63-bit Snowflake ID.
///
/// - 1 bit reserved (always zero, so the value fits a signed 64-bit integer)
/// - 41 bits timestamp (ms since [`TLDR_EPOCH`])
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21          12 11             0
///              +--------------+----------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
///              +--------------+----------------+--------------+---------------+
///              |<----------- MSB --------- 64 bits ---------- LSB ----------->|
/// ```
///
/// IDs issued by a single generator compare in generation order, both as
/// integers and through the derived [`Ord`]. The canonical textual form is
/// the plain base-10 rendering produced by [`Display`], which [`FromStr`]
/// inverts exactly.
///
/// ```
/// use tldr_snowflake::SnowflakeId;
///
/// let id: SnowflakeId = "7013874239516868608".parse().unwrap();
/// assert_eq!(id.to_string(), "7013874239516868608");
/// assert_eq!(i64::from(id), 7_013_874_239_516_868_608);
/// ```
///
/// [`TLDR_EPOCH`]: crate::TLDR_EPOCH
/// [`Display`]: fmt::Display
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for the 41-bit timestamp field. Occupies bits 22 through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for the 10-bit node ID field. Occupies bits 12 through 21.
    pub const NODE_ID_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the node ID to its position (bit 12).
    pub const NODE_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Largest raw value an ID can hold.
    pub const MAX_RAW: u64 = i64::MAX as u64;

    pub(crate) const fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(node_id <= Self::NODE_ID_MASK, "node_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    pub(crate) const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    pub(crate) const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    pub(crate) const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the packed value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Returns the packed value as a signed integer, suitable for `BIGINT`
    /// columns and other signed 64-bit sinks. Always non-negative.
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_i64()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SnowflakeId").field(&self.id).finish()
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| Error::InvalidId {
            input: s.to_owned(),
            reason,
        };

        if s.is_empty() {
            return Err(invalid(IdParseReason::Empty));
        }

        let mut id: u64 = 0;
        for c in s.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| invalid(IdParseReason::InvalidDigit(c)))?;
            id = id
                .checked_mul(10)
                .and_then(|id| id.checked_add(u64::from(digit)))
                .filter(|id| *id <= Self::MAX_RAW)
                .ok_or_else(|| invalid(IdParseReason::Overflow))?;
        }

        Ok(Self { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_land_in_their_fields() {
        let id = SnowflakeId::from_components(1, 5, 7);
        assert_eq!(id.to_raw(), (1 << 22) | (5 << 12) | 7);
        assert_eq!(id.timestamp(), 1);
        assert_eq!(id.node_id(), 5);
        assert_eq!(id.sequence(), 7);
    }

    #[test]
    fn max_components_fit_in_63_bits() {
        let id = SnowflakeId::from_components(
            SnowflakeId::TIMESTAMP_MASK,
            SnowflakeId::NODE_ID_MASK,
            SnowflakeId::SEQUENCE_MASK,
        );
        assert_eq!(id.to_raw(), SnowflakeId::MAX_RAW);
        assert_eq!(id.to_i64(), i64::MAX);
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = SnowflakeId::from_components(10, 1023, 4095);
        let b = SnowflakeId::from_components(11, 0, 0);
        let c = SnowflakeId::from_components(11, 0, 1);
        assert!(a < b && b < c);
        assert!(a.to_raw() < b.to_raw() && b.to_raw() < c.to_raw());
    }

    #[test]
    fn display_is_plain_decimal() {
        let id = SnowflakeId::from_components(123_456, 42, 9);
        let s = id.to_string();
        assert!(!s.is_empty());
        assert!(s.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(s, id.to_raw().to_string());
        assert_eq!(s.parse::<SnowflakeId>().unwrap(), id);
    }

    #[test]
    fn zero_renders_as_single_digit() {
        assert_eq!(SnowflakeId::default().to_string(), "0");
        assert_eq!("0".parse::<SnowflakeId>().unwrap(), SnowflakeId::default());
    }

    #[test]
    fn parse_accepts_largest_value() {
        let id: SnowflakeId = "9223372036854775807".parse().unwrap();
        assert_eq!(id.to_raw(), SnowflakeId::MAX_RAW);
    }

    #[test]
    fn parse_rejects_empty() {
        let err = "".parse::<SnowflakeId>().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidId {
                input: String::new(),
                reason: IdParseReason::Empty,
            }
        );
    }

    #[test]
    fn parse_rejects_signs_and_junk() {
        for (input, bad) in [("-1", '-'), ("+1", '+'), ("12a", 'a'), (" 1", ' ')] {
            let err = input.parse::<SnowflakeId>().unwrap_err();
            assert_eq!(
                err,
                Error::InvalidId {
                    input: input.to_owned(),
                    reason: IdParseReason::InvalidDigit(bad),
                }
            );
        }
    }

    #[test]
    fn parse_rejects_values_past_63_bits() {
        for input in ["9223372036854775808", "18446744073709551616", "99999999999999999999999"] {
            let err = input.parse::<SnowflakeId>().unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidId {
                    reason: IdParseReason::Overflow,
                    ..
                }
            ));
        }
    }

    #[test]
    fn debug_shows_raw_value() {
        let id = SnowflakeId::from_components(0, 0, 3);
        assert_eq!(format!("{id:?}"), "SnowflakeId(3)");
    }
}
