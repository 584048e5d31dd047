//! Source ID derivation.

use serde::Serialize;

use loxly_api::{ConfigId, Id128};
use loxly_config::Config;

use crate::cli::{GlobalOpts, SourceIdArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct SourceIdView {
    config_id: ConfigId,
    uuid: Id128,
    source_id: String,
}

pub fn handle(args: &SourceIdArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let config_id = config::require_config_id(global, cfg)?;
    let uuid = util::parse_id(&args.uuid)?;

    let view = SourceIdView {
        config_id,
        uuid,
        source_id: loxly_core::source_id(config_id, uuid, args.name.as_deref()),
    };
    let out = output::render_single(
        &global.format(),
        &view,
        |v| {
            output::detail_lines(&[
                ("Config ID", v.config_id.to_string()),
                ("UUID", v.uuid.to_string()),
                ("Source ID", v.source_id.clone()),
            ])
        },
        |v| v.source_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
