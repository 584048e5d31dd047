// ── Core error types ──
//
// Domain errors from loxly-core. Consumers never match on raw wire errors;
// the `From<loxly_api::Error>` impl translates them into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Invalid firmware version '{value}': {reason}")]
    InvalidVersion { value: String, reason: String },

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Unknown message kind 0x{raw:02x} ({length} byte payload)")]
    UnknownMessageKind { raw: u8, length: u32 },

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("Malformed response: {message}")]
    Response { message: String, body: String },

    // ── Structure file errors ────────────────────────────────────────
    /// The structure file could not be read or is not well-formed XML.
    /// Mappings emitted before the failure stand.
    #[error("Failed reading structure file at byte {position}: {source}")]
    Io {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if the current frame can be dropped and the stream
    /// continued.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownCommand { .. } | Self::UnknownMessageKind { .. }
        )
    }
}

// ── Conversion from wire-layer errors ───────────────────────────────

impl From<loxly_api::Error> for CoreError {
    fn from(err: loxly_api::Error) -> Self {
        match err {
            loxly_api::Error::MalformedIdentifier { value, reason }
            | loxly_api::Error::MalformedConfigId { value, reason } => CoreError::InvalidIdentifier {
                value,
                reason: reason.into(),
            },
            loxly_api::Error::MalformedVersion { value, reason } => CoreError::InvalidVersion {
                value,
                reason: reason.into(),
            },
            loxly_api::Error::UnknownMessageKind { raw, length } => {
                CoreError::UnknownMessageKind { raw, length }
            }
            loxly_api::Error::UnknownCommand(command) => CoreError::UnknownCommand { command },
            loxly_api::Error::Deserialization { message, body } => {
                CoreError::Response { message, body }
            }
            e @ (loxly_api::Error::Truncated { .. } | loxly_api::Error::UnexpectedMarker { .. }) => {
                CoreError::Protocol {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_errors_map_to_domain_variants() {
        let err: CoreError = loxly_api::Error::UnknownCommand("jdev/x".into()).into();
        assert!(matches!(err, CoreError::UnknownCommand { ref command } if command == "jdev/x"));
        assert!(err.is_recoverable());

        let err: CoreError = loxly_api::Error::Truncated {
            needed: 8,
            available: 2,
        }
        .into();
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Protocol error: Truncated input: needed 8 bytes, 2 available"
        );
    }

    #[test]
    fn config_id_errors_are_identifier_errors() {
        let err: CoreError = loxly_api::Error::MalformedConfigId {
            value: "a/b".into(),
            reason: "bad",
        }
        .into();
        assert!(matches!(err, CoreError::InvalidIdentifier { .. }));
    }
}
