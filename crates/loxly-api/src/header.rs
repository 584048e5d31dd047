//! Binary frame header.
//!
//! Every message the Miniserver sends is announced by an 8-byte binary
//! header, followed by a separate frame carrying `length` payload bytes:
//!
//! ```text
//! [0x03 marker][kind][info flags][reserved][length: u32 little-endian]
//! ```
//!
//! Decoding always consumes the full 8 bytes once they are available, even
//! when the kind is unknown, so the stream stays aligned.

use std::fmt;

use bitflags::bitflags;
use bytes::{Buf, BufMut};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::Error;

/// Size of an encoded header.
pub const HEADER_LEN: usize = 8;

/// First byte of every header.
pub const FRAME_MARKER: u8 = 0x03;

// ── MessageKind ─────────────────────────────────────────────────────

/// What the payload following a header contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum MessageKind {
    /// JSON text, usually an `{"LL": …}` command response.
    TextMessage,
    /// A file: the structure file, an icon, …
    BinaryFile,
    /// Table of `(uuid, f64)` state updates.
    EventTableValueStates,
    /// Table of `(uuid, icon uuid, text)` state updates.
    EventTableTextStates,
    EventTableDaytimerStates,
    /// The Miniserver is about to go offline; no payload follows.
    OutOfServiceIndicator,
    /// Answer to a `keepalive` command; no payload follows.
    Keepalive,
    EventTableWeatherStates,
}

/// Raw kind byte → kind, indexed by the byte value.
const KIND_TABLE: [MessageKind; 8] = [
    MessageKind::TextMessage,
    MessageKind::BinaryFile,
    MessageKind::EventTableValueStates,
    MessageKind::EventTableTextStates,
    MessageKind::EventTableDaytimerStates,
    MessageKind::OutOfServiceIndicator,
    MessageKind::Keepalive,
    MessageKind::EventTableWeatherStates,
];

impl MessageKind {
    pub fn from_raw(raw: u8) -> Option<Self> {
        KIND_TABLE.get(usize::from(raw)).copied()
    }

    pub fn raw(self) -> u8 {
        let idx = KIND_TABLE.iter().position(|k| *k == self).unwrap_or_default();
        u8::try_from(idx).unwrap_or_default()
    }

    /// Kinds whose payload is a binary event table.
    pub fn is_event_table(self) -> bool {
        matches!(
            self,
            Self::EventTableValueStates
                | Self::EventTableTextStates
                | Self::EventTableDaytimerStates
                | Self::EventTableWeatherStates
        )
    }

    /// Kinds that are complete without a payload frame.
    pub fn is_header_only(self) -> bool {
        matches!(self, Self::OutOfServiceIndicator | Self::Keepalive)
    }
}

// ── MessageInfo ─────────────────────────────────────────────────────

bitflags! {
    /// Header info flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageInfo: u8 {
        /// `length` is an estimate; the payload frame is authoritative.
        const ESTIMATED_SIZE = 0x01;
    }
}

const INFO_NAMES: [(MessageInfo, &str); 1] = [(MessageInfo::ESTIMATED_SIZE, "EstimatedSize")];

impl fmt::Display for MessageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = INFO_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name);
        for (i, name) in names.enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

// ── MessageHeader ───────────────────────────────────────────────────

/// Decoded frame header. Constructed per inbound frame, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub kind: MessageKind,
    pub info: MessageInfo,
    /// Expected payload length; an estimate when
    /// [`MessageInfo::ESTIMATED_SIZE`] is set.
    pub length: u32,
}

impl MessageHeader {
    pub fn new(kind: MessageKind, info: MessageInfo, length: u32) -> Self {
        Self { kind, info, length }
    }

    /// Decode a header from the cursor position, advancing it by exactly
    /// [`HEADER_LEN`] bytes.
    ///
    /// With fewer than 8 bytes available nothing is consumed and
    /// [`Error::Truncated`] is returned. Payload length is not checked
    /// here; that is the transport's concern.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, Error> {
        if buf.remaining() < HEADER_LEN {
            return Err(Error::Truncated {
                needed: HEADER_LEN,
                available: buf.remaining(),
            });
        }

        let marker = buf.get_u8();
        let raw_kind = buf.get_u8();
        let info = MessageInfo::from_bits_truncate(buf.get_u8());
        buf.advance(1);
        let length = buf.get_u32_le();

        if marker != FRAME_MARKER {
            return Err(Error::UnexpectedMarker { marker });
        }
        let kind = MessageKind::from_raw(raw_kind).ok_or(Error::UnknownMessageKind {
            raw: raw_kind,
            length,
        })?;

        let header = Self { kind, info, length };
        tracing::trace!(%header, "decoded frame header");
        Ok(header)
    }

    /// Decode from the start of a byte slice.
    pub fn decode_slice(mut bytes: &[u8]) -> Result<Self, Error> {
        Self::decode(&mut bytes)
    }

    /// Write the 8-byte wire form.
    pub fn write(self, buf: &mut impl BufMut) {
        buf.put_u8(FRAME_MARKER);
        buf.put_u8(self.kind.raw());
        buf.put_u8(self.info.bits());
        buf.put_u8(0);
        buf.put_u32_le(self.length);
    }

    pub fn encode(self) -> [u8; HEADER_LEN] {
        let mut out = [0_u8; HEADER_LEN];
        self.write(&mut &mut out[..]);
        out
    }

    pub fn is_estimated(self) -> bool {
        self.info.contains(MessageInfo::ESTIMATED_SIZE)
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.info.is_empty() {
            write!(f, "; flags={}", self.info)?;
        }
        write!(f, "; length={}", self.length)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn frame(prefix: [u8; 4], length: u32) -> Vec<u8> {
        let mut bytes = prefix.to_vec();
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes
    }

    #[test]
    fn text_message_header() {
        let length = 0xFAFB_FCFD;
        let bytes = frame([0x03, 0x00, 0x00, 0x00], length);
        let mut buf = &bytes[..];

        let header = MessageHeader::decode(&mut buf).unwrap();
        assert_eq!(header.kind, MessageKind::TextMessage);
        assert!(header.info.is_empty());
        assert_eq!(header.length, length);
        assert!(buf.is_empty(), "cursor should sit after the header");
        insta::assert_snapshot!(header.to_string(), @"TextMessage; length=4210818301");
    }

    #[test]
    fn binary_file_header_with_estimated_length() {
        let length = 0xFFFE_FDFC;
        let bytes = frame([0x03, 0x01, 0x01, 0x00], length);
        let mut buf = &bytes[..];

        let header = MessageHeader::decode(&mut buf).unwrap();
        assert_eq!(header.kind, MessageKind::BinaryFile);
        assert_eq!(header.info, MessageInfo::ESTIMATED_SIZE);
        assert!(header.is_estimated());
        assert_eq!(header.length, length);
        assert!(buf.is_empty());
        insta::assert_snapshot!(
            header.to_string(),
            @"BinaryFile; flags=EstimatedSize; length=4294901244"
        );
    }

    #[test]
    fn unknown_kind_still_consumes_header() {
        let mut bytes = frame([0x03, 0x42, 0x00, 0x00], 12);
        bytes.extend_from_slice(b"payload");
        let mut buf = &bytes[..];

        let err = MessageHeader::decode(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownMessageKind {
                raw: 0x42,
                length: 12
            }
        ));
        assert_eq!(buf, b"payload");
    }

    #[test]
    fn bad_marker_consumes_header() {
        let bytes = frame([0x07, 0x00, 0x00, 0x00], 1);
        let mut buf = &bytes[..];
        let err = MessageHeader::decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::UnexpectedMarker { marker: 0x07 }));
        assert!(buf.is_empty());
    }

    #[test]
    fn short_input_consumes_nothing() {
        let bytes = [0x03, 0x00, 0x00];
        let mut buf = &bytes[..];
        let err = MessageHeader::decode(&mut buf).unwrap_err();
        assert!(err.is_incomplete());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn unknown_flag_bits_are_dropped() {
        let header = MessageHeader::decode_slice(&frame([0x03, 0x02, 0xF1, 0x00], 24)).unwrap();
        assert_eq!(header.kind, MessageKind::EventTableValueStates);
        assert_eq!(header.info, MessageInfo::ESTIMATED_SIZE);
    }

    #[test]
    fn kind_table_matches_raw_values() {
        for (raw, kind) in MessageKind::iter().enumerate() {
            let raw = u8::try_from(raw).unwrap();
            assert_eq!(MessageKind::from_raw(raw), Some(kind));
            assert_eq!(kind.raw(), raw);
        }
        assert_eq!(MessageKind::from_raw(8), None);
        assert_eq!(MessageKind::from_raw(0xFF), None);
    }

    #[test]
    fn encode_matches_decode() {
        let header = MessageHeader::new(MessageKind::Keepalive, MessageInfo::empty(), 0);
        assert_eq!(header.encode(), [0x03, 0x06, 0, 0, 0, 0, 0, 0]);
        assert_eq!(MessageHeader::decode_slice(&header.encode()).unwrap(), header);
        assert!(header.kind.is_header_only());
    }
}
