use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Global headset identifier, as printed on the unit.
///
/// Zero is reserved for "any headset" and makes the dongle auto-connect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HeadsetId(u16);

/// Error returned when parsing a [`HeadsetId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid headset id '{0}' (expected up to 4 hex digits)")]
pub struct ParseHeadsetIdError(String);

impl HeadsetId {
    /// The auto-connect id.
    pub const ANY: HeadsetId = HeadsetId(0);

    /// Build an id from its raw 16-bit value.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Build an id from its wire bytes.
    pub const fn from_bytes(high: u8, low: u8) -> Self {
        Self(u16::from_be_bytes([high, low]))
    }

    /// Raw 16-bit value.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// High byte, sent first on the wire.
    pub const fn high(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Low byte.
    pub const fn low(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// Whether this id asks the dongle to pick any headset.
    pub const fn is_any(self) -> bool {
        self.0 == 0
    }
}

impl From<u16> for HeadsetId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HeadsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.get())
    }
}

impl FromStr for HeadsetId {
    type Err = ParseHeadsetIdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty()
            || digits.len() > 4
            || !digits.bytes().all(|byte| byte.is_ascii_hexdigit())
        {
            return Err(ParseHeadsetIdError(input.to_string()));
        }
        u16::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseHeadsetIdError(input.to_string()))
    }
}

impl Serialize for HeadsetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
