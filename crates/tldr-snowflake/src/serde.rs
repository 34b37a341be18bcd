//! `#[serde(with = ...)]` helpers for [`SnowflakeId`] fields.
//!
//! - [`as_decimal_str`] writes the ID as its decimal string. Use it for JSON
//!   that is consumed by clients whose numbers are IEEE-754 doubles, which
//!   cannot hold 63-bit integers exactly.
//! - [`as_native`] writes the ID as a plain integer.
//!
//! [`SnowflakeId`]: crate::SnowflakeId

use ::serde::{Deserialize, Deserializer, Serializer};

pub mod as_decimal_str {
    use super::{Deserializer, Serializer};
    use crate::SnowflakeId;

    /// Serialize a snowflake ID as its decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// Deserialize a snowflake ID from its decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The string is not a decimal number in the 63-bit ID range
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DecimalVisitor;

        impl ::serde::de::Visitor<'_> for DecimalVisitor {
            type Value = SnowflakeId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a decimal snowflake id string")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: ::serde::de::Error,
            {
                v.parse().map_err(::serde::de::Error::custom)
            }
        }

        d.deserialize_str(DecimalVisitor)
    }
}

pub mod as_native {
    use super::{Deserialize, Deserializer, Serializer};
    use crate::SnowflakeId;

    /// Serialize a snowflake ID as its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u64(id.to_raw())
    }

    /// Deserialize a snowflake ID from its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The value does not fit in 63 bits
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u64::deserialize(d)?;
        if raw > SnowflakeId::MAX_RAW {
            return Err(::serde::de::Error::custom(crate::Error::InvalidId {
                input: raw.to_string(),
                reason: crate::IdParseReason::Overflow,
            }));
        }
        Ok(SnowflakeId::from_raw(raw))
    }
}
