//! Fixed-capacity venue identifier.

use std::fmt;
use std::str::FromStr;

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

use crate::error::Error;

/// Maximum venue id length in bytes
pub const VENUE_ID_CAPACITY: usize = 12;

/// Inline, fixed-capacity venue identifier.
///
/// `Copy` so heartbeat and order-result events carrying a venue id can
/// cross SPSC rings by value. Holds up to [`VENUE_ID_CAPACITY`] bytes of
/// ASCII, e.g. `"BINANCE"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct VenueId {
    bytes: [u8; VENUE_ID_CAPACITY],
    len: u8,
}

impl VenueId {
    /// Create a venue id from a string.
    ///
    /// # Errors
    /// Fails if the string is empty, too long, or not ASCII.
    pub fn new(id: &str) -> Result<Self, Error> {
        if id.is_empty() || id.len() > VENUE_ID_CAPACITY || !id.is_ascii() {
            return Err(Error::InvalidVenueId(id.to_string()));
        }

        let mut bytes = [0u8; VENUE_ID_CAPACITY];
        bytes[..id.len()].copy_from_slice(id.as_bytes());
        Ok(Self {
            bytes,
            len: id.len() as u8,
        })
    }

    /// View as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII, so this cannot fail.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl FromStr for VenueId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VenueId({})", self.as_str())
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for VenueId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for VenueId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        VenueId::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_id_roundtrip() {
        let id = VenueId::new("BINANCE").unwrap();
        assert_eq!(id.as_str(), "BINANCE");
        assert_eq!(format!("{id}"), "BINANCE");
    }

    #[test]
    fn test_venue_id_equality() {
        let a = VenueId::new("KRAKEN").unwrap();
        let b: VenueId = "KRAKEN".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_venue_id_rejects_bad_input() {
        assert!(VenueId::new("").is_err());
        assert!(VenueId::new("THIRTEEN_BYTES").is_err());
        assert!(VenueId::new("vénue").is_err());
    }
}
