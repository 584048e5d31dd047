//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use loxly_config::ConfigError;
use loxly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const DATA: i32 = 65;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(loxly::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid {kind} '{value}': {reason}")]
    #[diagnostic(
        code(loxly::invalid_identifier),
        help(
            "Identifiers are 32 hex digits, e.g. 0e839a0b-00d8-1ab1-ffffa1b98ee6c71d.\n\
             Config IDs are up to 8 of [0-9A-Za-z._-] or exactly 16 hex digits."
        )
    )]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown command: {command}")]
    #[diagnostic(
        code(loxly::unknown_command),
        help("Run: loxly command --list to see known commands")
    )]
    UnknownCommand { command: String },

    // ── Decoding ─────────────────────────────────────────────────────
    #[error("Could not decode {what}: {message}")]
    #[diagnostic(code(loxly::decode))]
    Decode { what: String, message: String },

    #[error("Failed reading {path}")]
    #[diagnostic(code(loxly::structure_file))]
    StructureFile {
        path: String,
        #[source]
        source: CoreError,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(loxly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: loxly config add <NAME> --host <HOST>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No config ID available")]
    #[diagnostic(
        code(loxly::no_config_id),
        help("Pass --config-id, set LOXLY_CONFIG_ID, or set config_id in the profile.")
    )]
    NoConfigId,

    #[error("No structure file given")]
    #[diagnostic(
        code(loxly::no_structure_file),
        help("Pass a FILE argument or set structure_file in the profile.")
    )]
    NoStructureFile,

    #[error(transparent)]
    #[diagnostic(code(loxly::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(loxly::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. }
            | Self::InvalidIdentifier { .. }
            | Self::UnknownCommand { .. }
            | Self::NoConfigId
            | Self::NoStructureFile => exit_code::USAGE,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Decode { .. } | Self::StructureFile { .. } => exit_code::DATA,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Library error → CliError mapping ─────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidIdentifier { value, reason } => CliError::InvalidIdentifier {
                kind: "identifier",
                value,
                reason,
            },
            CoreError::InvalidVersion { value, reason } => CliError::Validation {
                field: "version".into(),
                reason: format!("'{value}': {reason}"),
            },
            CoreError::UnknownCommand { command } => CliError::UnknownCommand { command },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::Validation {
                field: entity_type,
                reason: format!("'{identifier}' not found"),
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            other => CliError::Decode {
                what: "input".into(),
                message: other.to_string(),
            },
        }
    }
}

impl From<loxly_api::Error> for CliError {
    fn from(err: loxly_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
