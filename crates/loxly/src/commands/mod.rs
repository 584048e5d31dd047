//! Command dispatch: bridges CLI args -> library calls -> output formatting.

pub mod command;
pub mod config_cmd;
pub mod frames;
pub mod header;
pub mod ids;
pub mod scan;
pub mod source;
pub mod util;
pub mod version;

use loxly_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Header(args) => header::handle(&args, global),
        Command::Id(args) => ids::handle_id(&args, global),
        Command::ConfigId(args) => ids::handle_config_id(&args, global),
        Command::Permissions(args) => ids::handle_permissions(&args, global),
        Command::Command(args) => command::handle(&args, global),
        Command::Version(args) => version::handle(&args, global),
        Command::SourceId(args) => source::handle(&args, cfg, global),
        Command::Scan(args) => scan::handle(args, cfg, global),
        Command::Frames(args) => frames::handle(&args, cfg, global),
        Command::Config(args) => config_cmd::handle(args, cfg, global),
        Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "completions are generated before dispatch".into(),
        }),
    }
}
