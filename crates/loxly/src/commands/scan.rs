//! Structure file scanning.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use serde::Serialize;
use tabled::Tabled;

use loxly_api::Id128;
use loxly_config::Config;
use loxly_core::{
    MemoryStore, SourceMapping, SourceMappingStore, StructureScanner, import_source_mappings,
};

use crate::cli::{GlobalOpts, ScanArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct MappingView {
    uuid: Id128,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_id: Option<String>,
}

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Source ID")]
    source_id: String,
}

impl From<&MappingView> for MappingRow {
    fn from(m: &MappingView) -> Self {
        Self {
            uuid: m.uuid.to_string(),
            name: m.name.clone(),
            source_id: m.source_id.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

pub fn handle(args: ScanArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let profile = config::active_profile(global, cfg)?;
    let path: PathBuf = args
        .file
        .or_else(|| profile.and_then(|p| p.structure_file.clone()))
        .ok_or(CliError::NoStructureFile)?;

    let container_types = if args.container_types.is_empty() {
        profile.map(|p| p.container_types.clone()).unwrap_or_default()
    } else {
        args.container_types
    };
    let scanner = if container_types.is_empty() {
        StructureScanner::new()
    } else {
        StructureScanner::with_container_types(container_types)
    };

    let reader = BufReader::new(File::open(&path)?);
    let failed = |source: loxly_core::CoreError| CliError::StructureFile {
        path: path.display().to_string(),
        source,
    };

    // With a config ID the mappings go through import, which sanitizes
    // names the way they are published.
    let views: Vec<MappingView> = match config::config_id(global, cfg)? {
        Some(config_id) => {
            let store = MemoryStore::new();
            import_source_mappings(reader, &scanner, config_id, &store).map_err(failed)?;
            store
                .mappings_for_config(config_id)
                .map_err(failed)?
                .into_iter()
                .map(|m| MappingView {
                    source_id: Some(loxly_core::source_id(config_id, m.uuid, Some(&m.source_id))),
                    uuid: m.uuid,
                    name: m.source_id,
                })
                .collect()
        }
        None => {
            let mut found: Vec<SourceMapping> = Vec::new();
            scanner
                .scan(reader, |m| found.push(m))
                .map_err(failed)?;
            found
                .into_iter()
                .map(|m| MappingView {
                    uuid: m.uuid,
                    name: m.source_id,
                    source_id: None,
                })
                .collect()
        }
    };
    tracing::info!(path = %path.display(), mappings = views.len(), "scanned structure file");

    let out = output::render_list(
        &global.format(),
        &views,
        |m| MappingRow::from(m),
        |m| format!("{}\t{}", m.uuid, m.source_id.as_deref().unwrap_or(&m.name)),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
