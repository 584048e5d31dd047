// ── Miniserver identity type ──
//
// Every structural entity (controls, rooms, categories, states, events)
// is keyed by a 128-bit UUID. The Miniserver renders it as 8-4-4-16 hex:
// the dash before the final group is omitted. Id128 wraps `uuid::Uuid`
// and owns that text form, the serde contract, and the binary layout
// used inside event tables.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::Error;

/// Byte length of a binary identifier inside an event table.
pub const ID128_BINARY_LEN: usize = 16;

const HEX_DIGITS: usize = 32;

// ── Id128 ───────────────────────────────────────────────────────────

/// Identifier for any Miniserver entity.
///
/// `Display` and serde use the wire form (`0e839a0b-00d8-1ab1-ffffa1b98ee6c71d`).
/// Parsing accepts the wire form and the standard fully dashed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id128(Uuid);

impl Id128 {
    pub const NIL: Self = Self(Uuid::nil());

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; ID128_BINARY_LEN] {
        self.0.as_bytes()
    }

    /// Render in the Miniserver wire form (`8-4-4-16`).
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Render in the standard `8-4-4-4-12` form.
    pub fn to_canonical(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Parse the wire form or the standard dashed form.
    ///
    /// All `-` separators are stripped first; what remains must be exactly
    /// 32 hex digits.
    pub fn decode(text: &str) -> Result<Self, Error> {
        let digits: String = text.chars().filter(|c| *c != '-').collect();
        if digits.len() != HEX_DIGITS {
            return Err(Error::MalformedIdentifier {
                value: text.to_owned(),
                reason: "expected 32 hex digits",
            });
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::MalformedIdentifier {
                value: text.to_owned(),
                reason: "non-hex character",
            });
        }
        u128::from_str_radix(&digits, 16)
            .map(Self::from_u128)
            .map_err(|_| Error::MalformedIdentifier {
                value: text.to_owned(),
                reason: "non-hex character",
            })
    }

    /// Read a binary identifier from an event table.
    ///
    /// Layout: `u32 LE`, `u16 LE`, `u16 LE`, then 8 bytes as-is.
    pub fn read_le(buf: &mut impl Buf) -> Result<Self, Error> {
        if buf.remaining() < ID128_BINARY_LEN {
            return Err(Error::Truncated {
                needed: ID128_BINARY_LEN,
                available: buf.remaining(),
            });
        }
        let mut raw = [0_u8; ID128_BINARY_LEN];
        buf.copy_to_slice(&mut raw);
        Ok(Self(Uuid::from_bytes_le(raw)))
    }

    /// Write the binary event-table layout, the inverse of [`read_le`](Self::read_le).
    pub fn write_le(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.0.to_bytes_le());
    }
}

impl fmt::Display for Id128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d1, d2, d3, d4) = self.0.as_fields();
        write!(
            f,
            "{d1:08x}-{d2:04x}-{d3:04x}-{:016x}",
            u64::from_be_bytes(*d4)
        )
    }
}

impl FromStr for Id128 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<Uuid> for Id128 {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Id128> for Uuid {
    fn from(id: Id128) -> Self {
        id.0
    }
}

// ── Serde ───────────────────────────────────────────────────────────
//
// The same impls serve fields and map keys: serde_json routes object keys
// through `collect_str` / string deserialization.

impl Serialize for Id128 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id128 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Cow::<'de, str>::deserialize(deserializer)?;
        Self::decode(&text).map_err(serde::de::Error::custom)
    }
}

/// Deserialize a name → identifier object whose values may also be arrays.
///
/// Array entries are flattened to indexed keys, so
/// `{"value": "…", "history": ["…", "…"]}` yields `value`, `history[0]`,
/// `history[1]`. Use with `#[serde(deserialize_with = "...")]`.
pub fn deserialize_indexed_ids<'de, D>(deserializer: D) -> Result<BTreeMap<String, Id128>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Id128),
        Many(Vec<Id128>),
    }

    let raw = BTreeMap::<String, OneOrMany>::deserialize(deserializer)?;
    let mut out = BTreeMap::new();
    for (name, value) in raw {
        match value {
            OneOrMany::One(id) => {
                out.insert(name, id);
            }
            OneOrMany::Many(ids) => {
                for (idx, id) in ids.into_iter().enumerate() {
                    out.insert(format!("{name}[{idx}]"), id);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CANONICAL: &str = "0e839a0b-00d8-1ab1-ffff-a1b98ee6c71d";
    const WIRE: &str = "0e839a0b-00d8-1ab1-ffffa1b98ee6c71d";

    fn sample() -> Id128 {
        Id128::from_uuid(Uuid::parse_str(CANONICAL).unwrap())
    }

    #[test]
    fn encodes_without_last_dash() {
        assert_eq!(sample().encode(), WIRE);
        assert_eq!(sample().to_canonical(), CANONICAL);
    }

    #[test]
    fn decodes_wire_and_canonical_forms() {
        assert_eq!(Id128::decode(WIRE).unwrap(), sample());
        assert_eq!(Id128::decode(CANONICAL).unwrap(), sample());
        assert_eq!(Id128::decode(&WIRE.to_uppercase()).unwrap(), sample());
    }

    #[test]
    fn round_trips_edge_values() {
        for id in [Id128::NIL, Id128::from_u128(u128::MAX), sample()] {
            assert_eq!(Id128::decode(&id.encode()).unwrap(), id);
            assert_eq!(Id128::decode(&id.to_canonical()).unwrap(), id);
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let err = Id128::decode("0e839a0b-00d8-1ab1-ffffa1b98ee6c71").unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
        assert!(Id128::decode("").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let err = Id128::decode("0e839a0b-00d8-1ab1-ffffa1b98ee6c7zz").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedIdentifier {
                reason: "non-hex character",
                ..
            }
        ));
        // u128 parsing tolerates a leading '+', the digit check must not
        assert!(Id128::decode("+e839a0b00d81ab1ffffa1b98ee6c71d").is_err());
    }

    #[test]
    fn serializes_as_wire_string() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, format!("\"{WIRE}\""));
        let back: Id128 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn serializes_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(sample(), "foo");
        map.insert(Id128::decode("0e839a0b-00d8-1ab1-ffff-a1b98ee6c71e").unwrap(), "bar");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            "{\"0e839a0b-00d8-1ab1-ffffa1b98ee6c71d\":\"foo\",\"0e839a0b-00d8-1ab1-ffffa1b98ee6c71e\":\"bar\"}"
        );
        let back: BTreeMap<Id128, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[&sample()], "foo");
    }

    #[test]
    fn binary_layout_is_mixed_endian() {
        let raw: [u8; 16] = [
            0x0b, 0x9a, 0x83, 0x0e, 0xd8, 0x00, 0xb1, 0x1a, 0xff, 0xff, 0xa1, 0xb9, 0x8e, 0xe6,
            0xc7, 0x1d,
        ];
        let mut buf = &raw[..];
        let id = Id128::read_le(&mut buf).unwrap();
        assert_eq!(id, sample());
        assert!(buf.is_empty());

        let mut out = Vec::new();
        id.write_le(&mut out);
        assert_eq!(out, raw);
    }

    #[test]
    fn binary_read_requires_sixteen_bytes() {
        let mut buf = &[0_u8; 10][..];
        let err = Id128::read_le(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                needed: 16,
                available: 10
            }
        ));
    }

    #[test]
    fn indexed_ids_flatten_arrays() {
        #[derive(Deserialize)]
        struct States {
            #[serde(deserialize_with = "deserialize_indexed_ids")]
            states: BTreeMap<String, Id128>,
        }

        let json = format!(
            r#"{{"states": {{"value": "{WIRE}", "history": ["{WIRE}", "{CANONICAL}"]}}}}"#
        );
        let parsed: States = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = parsed.states.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["history[0]", "history[1]", "value"]);
        assert!(parsed.states.values().all(|id| *id == sample()));
    }
}
