//! Clap derive structures for the `loxly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// loxly -- inspect and decode the Loxone Miniserver protocol
#[derive(Debug, Parser)]
#[command(
    name = "loxly",
    version,
    about = "Decode and inspect Loxone Miniserver protocol data",
    long_about = "Offline tools for the Loxone Miniserver WebSocket protocol.\n\n\
        Decodes frame headers, identifiers, config IDs and permissions,\n\
        resolves command text, and scans project files for source mappings.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Miniserver profile to use
    #[arg(long, short = 'p', env = "LOXLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config ID, friendly or 16 hex digits (overrides profile)
    #[arg(long, env = "LOXLY_CONFIG_ID", global = true)]
    pub config_id: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "LOXLY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOpts {
    pub fn format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }
}

// ── Output Format ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode an 8-byte frame header
    #[command(alias = "hdr")]
    Header(HeaderArgs),

    /// Convert a 128-bit identifier between its text forms
    Id(IdArgs),

    /// Convert a config ID between its numeric and external forms
    ConfigId(ConfigIdArgs),

    /// Decode or build a token permission bitmask
    #[command(alias = "perms")]
    Permissions(PermissionsArgs),

    /// Resolve command text to a known command
    #[command(alias = "cmd")]
    Command(CommandArgs),

    /// Parse a firmware version and check feature gates
    Version(VersionArgs),

    /// Derive the source ID for a control
    SourceId(SourceIdArgs),

    /// Scan an XML project file for source mappings
    Scan(ScanArgs),

    /// Decode a captured stream of frames
    Frames(FramesArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Codec commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HeaderArgs {
    /// Header bytes as hex, e.g. "03 00 00 00 fd 00 fd fa"
    #[arg(required = true, num_args = 1..)]
    pub hex: Vec<String>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    /// Identifier in wire (8-4-4-16) or canonical (8-4-4-4-12) form
    pub value: String,
}

#[derive(Debug, Args)]
pub struct ConfigIdArgs {
    /// Friendly word or 16 hex digits; a decimal number with --numeric
    pub value: String,

    /// Treat VALUE as the numeric config ID
    #[arg(long, short = 'n')]
    pub numeric: bool,
}

#[derive(Debug, Args)]
#[command(group = clap::ArgGroup::new("input").required(true).args(["mask", "grant"]))]
pub struct PermissionsArgs {
    /// Bitmask received from the Miniserver
    pub mask: Option<i32>,

    /// Permission to include in a new bitmask (repeatable)
    #[arg(long, short = 'g', value_enum)]
    pub grant: Vec<PermissionName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionName {
    /// Short-lived web interface token
    Web,
    /// Long-lived app token
    App,
}

#[derive(Debug, Args)]
#[command(group = clap::ArgGroup::new("input").required(true).args(["text", "list"]))]
pub struct CommandArgs {
    /// Command or response control text, e.g. "jdev/sps/io/<uuid>/on"
    pub text: Option<String>,

    /// List every known command and its spellings
    #[arg(long, short = 'l')]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Firmware version, or the `dev/cfg/api` response value
    pub value: String,

    /// Minimum "major" or "major.minor" to check against
    #[arg(long)]
    pub at_least: Option<String>,
}

#[derive(Debug, Args)]
pub struct SourceIdArgs {
    /// Control identifier
    pub uuid: String,

    /// Name to publish under instead of the derived ID
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

// ── Structure & stream commands ──────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// XML project file (default: the profile's structure_file)
    pub file: Option<PathBuf>,

    /// Container `Type` to track (repeatable, replaces the defaults)
    #[arg(long = "container-type", short = 't')]
    pub container_types: Vec<String>,
}

#[derive(Debug, Args)]
pub struct FramesArgs {
    /// Binary capture: frame headers each followed by their payload
    pub file: PathBuf,

    /// Report value events even when the value did not change
    #[arg(long)]
    pub keep_unchanged: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Add or replace a profile, taking its config ID from --config-id
    Add {
        /// Profile name
        name: String,

        /// Miniserver host or address
        #[arg(long)]
        host: String,

        /// Structure file cache path
        #[arg(long)]
        structure_file: Option<PathBuf>,

        /// Store value events even when unchanged
        #[arg(long)]
        keep_unchanged: bool,
    },

    /// Remove a profile
    Remove {
        /// Profile name
        name: String,
    },

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
