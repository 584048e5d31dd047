use thiserror::Error;

/// Top-level error type for the `loxly-api` crate.
///
/// Covers every failure mode of the wire layer: identifier codecs, frame
/// headers, command resolution, version parsing and response envelopes.
/// `loxly-core` wraps these into its own domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Identifiers ─────────────────────────────────────────────────
    /// Identifier text is not 32 hex digits once separators are stripped.
    #[error("Malformed identifier '{value}': {reason}")]
    MalformedIdentifier { value: String, reason: &'static str },

    /// Config ID text is neither 16 hex digits nor a friendly ASCII form.
    #[error("Malformed config ID '{value}': {reason}")]
    MalformedConfigId { value: String, reason: &'static str },

    // ── Framing ─────────────────────────────────────────────────────
    /// Not enough bytes buffered to decode a structure.
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// The first header byte was not the frame marker.
    #[error("Unexpected frame marker 0x{marker:02x}")]
    UnexpectedMarker { marker: u8 },

    /// The header kind byte is not a known message kind. The header bytes
    /// were consumed; `length` lets the transport skip the payload.
    #[error("Unknown message kind 0x{raw:02x} (payload length {length})")]
    UnknownMessageKind { raw: u8, length: u32 },

    // ── Commands ────────────────────────────────────────────────────
    /// Command text matches no known command spelling.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // ── Versions ────────────────────────────────────────────────────
    /// Version text lacks a numeric major and minor component.
    #[error("Malformed version '{value}': {reason}")]
    MalformedVersion { value: String, reason: &'static str },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the caller may log and continue with the next frame.
    ///
    /// Newer controller firmware adds commands and message kinds; neither
    /// desynchronizes the stream since the header was fully consumed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownCommand(_) | Self::UnknownMessageKind { .. }
        )
    }

    /// Returns `true` if more bytes may turn this failure into a success.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}
