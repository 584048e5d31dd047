// ── Config identity ──
//
// A ConfigId names one Miniserver configuration snapshot. External
// applications see it either as 16 lowercase hex digits, or, when the
// big-endian bytes spell a short ASCII word, as that word ("Hello").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

const HEX_LEN: usize = 16;
const MAX_FRIENDLY_LEN: usize = 8;

/// Bytes allowed in the friendly rendering: `0-9 A-Z a-z _ . -`.
///
/// Narrower than printable ASCII so the friendly form never contains `/`
/// or whitespace, both of which would break derived source paths.
fn is_friendly_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-')
}

/// 64-bit identifier of a Miniserver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConfigId(u64);

impl ConfigId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Always the 16-digit lowercase hex rendering.
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }

    /// The friendly word when every significant byte is friendly, else hex.
    pub fn to_external(self) -> String {
        let bytes = self.0.to_be_bytes();
        let significant = match bytes.iter().position(|b| *b != 0) {
            Some(start) => &bytes[start..],
            None => return self.to_hex(),
        };
        if significant.iter().copied().all(is_friendly_byte) {
            // friendly bytes are ASCII, so this is always valid UTF-8
            significant.iter().map(|b| char::from(*b)).collect()
        } else {
            self.to_hex()
        }
    }

    /// Parse either external rendering.
    ///
    /// Exactly 16 hex digits parse as hex. Anything else must be 1 to 8
    /// friendly characters, packed big-endian into the low bytes. The two
    /// forms cannot collide: a friendly form is never 16 characters long.
    pub fn from_external(text: &str) -> Result<Self, Error> {
        if text.len() == HEX_LEN && text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return u64::from_str_radix(text, 16)
                .map(Self)
                .map_err(|_| Error::MalformedConfigId {
                    value: text.to_owned(),
                    reason: "invalid hex",
                });
        }
        if text.is_empty() {
            return Err(Error::MalformedConfigId {
                value: String::new(),
                reason: "empty",
            });
        }
        if text.len() > MAX_FRIENDLY_LEN {
            return Err(Error::MalformedConfigId {
                value: text.to_owned(),
                reason: "friendly form longer than 8 characters",
            });
        }
        if !text.bytes().all(is_friendly_byte) {
            return Err(Error::MalformedConfigId {
                value: text.to_owned(),
                reason: "friendly form allows only 0-9, A-Z, a-z, '_', '.', '-'",
            });
        }
        let packed = text
            .bytes()
            .fold(0_u64, |acc, b| (acc << 8) | u64::from(b));
        Ok(Self(packed))
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_external())
    }
}

impl FromStr for ConfigId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_external(s)
    }
}

impl From<u64> for ConfigId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ConfigId> for u64 {
    fn from(id: ConfigId) -> Self {
        id.0
    }
}

impl Serialize for ConfigId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConfigId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        Self::from_external(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HELLO_ID: u64 = 0x4865_6C6C_6F;
    const TEST_ID: u64 = 0x5FDF_FAF3_2FF2_BCFF;
    const TEST_ID_EXTERNAL: &str = "5fdffaf32ff2bcff";

    #[test]
    fn friendly_external_form() {
        assert_eq!(ConfigId::new(HELLO_ID).to_external(), "Hello");
        assert_eq!(ConfigId::from_external("Hello").unwrap().value(), HELLO_ID);
    }

    #[test]
    fn hex_external_form() {
        assert_eq!(ConfigId::new(TEST_ID).to_external(), TEST_ID_EXTERNAL);
        assert_eq!(
            ConfigId::from_external(TEST_ID_EXTERNAL).unwrap().value(),
            TEST_ID
        );
    }

    #[test]
    fn zero_and_small_values_use_padded_hex() {
        assert_eq!(ConfigId::new(0).to_external(), "0000000000000000");
        assert_eq!(ConfigId::new(0x01).to_external(), "0000000000000001");
        assert_eq!(ConfigId::from_external("0000000000000000").unwrap().value(), 0);
    }

    #[test]
    fn interior_zero_byte_is_not_friendly() {
        // "He\0lo"
        let id = ConfigId::new(0x4865_006C_6F);
        assert_eq!(id.to_external(), "0000004865006c6f");
        assert_eq!(ConfigId::from_external(&id.to_external()).unwrap(), id);
    }

    #[test]
    fn eight_byte_friendly_word() {
        let id = ConfigId::from_external("Miniserv").unwrap();
        assert_eq!(id.value(), u64::from_be_bytes(*b"Miniserv"));
        assert_eq!(id.to_external(), "Miniserv");
    }

    #[test]
    fn short_hex_looking_word_stays_friendly() {
        let id = ConfigId::from_external("cafe").unwrap();
        assert_eq!(id.value(), 0x6361_6665);
        assert_eq!(id.to_external(), "cafe");
    }

    #[test]
    fn round_trips_boundary_values() {
        for value in [0, 1, 0x7F, 0x2F, HELLO_ID, TEST_ID, u64::MAX, 1 << 63] {
            let id = ConfigId::new(value);
            assert_eq!(ConfigId::from_external(&id.to_external()).unwrap(), id);
        }
    }

    #[test]
    fn rejects_untranslatable_text() {
        assert!(ConfigId::from_external("").is_err());
        assert!(ConfigId::from_external("toolongname").is_err());
        assert!(ConfigId::from_external("a/b").is_err());
        assert!(ConfigId::from_external("héllo").is_err());
    }

    #[test]
    fn serde_uses_external_form() {
        let json = serde_json::to_string(&ConfigId::new(HELLO_ID)).unwrap();
        assert_eq!(json, "\"Hello\"");
        let back: ConfigId = serde_json::from_str("\"5fdffaf32ff2bcff\"").unwrap();
        assert_eq!(back.value(), TEST_ID);
    }
}
