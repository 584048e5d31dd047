// ── Source mapping import ──

use std::io::BufRead;

use loxly_api::ConfigId;

use crate::error::CoreError;
use crate::model::SourceMapping;
use crate::scanner::SourceMappingParser;
use crate::source::{max_mapping_len, sanitize_source_id};
use crate::store::SourceMappingStore;

/// Scan a structure document and store every mapping under `config_id`.
///
/// Names lose their whitespace and are cut so that `/{config key}/{name}`
/// fits a source ID. Names left empty are skipped. Returns the number of
/// mappings stored.
///
/// If the store fails, later mappings are not stored and the store error
/// is returned once the scan ends.
pub fn import_source_mappings<R, P, S>(
    input: R,
    parser: &P,
    config_id: ConfigId,
    store: &S,
) -> Result<usize, CoreError>
where
    R: BufRead,
    P: SourceMappingParser + ?Sized,
    S: SourceMappingStore + ?Sized,
{
    let max_len = max_mapping_len(config_id);
    let mut stored = 0_usize;
    let mut store_error = None;

    let scanned = parser.parse(input, &mut |mapping| {
        if store_error.is_some() {
            return;
        }
        let source_id = sanitize_source_id(&mapping.source_id, max_len);
        if source_id.is_empty() {
            tracing::debug!(uuid = %mapping.uuid, "skipping mapping with blank name");
            return;
        }
        let mapping = SourceMapping {
            source_id,
            ..mapping.with_config_id(config_id)
        };
        match store.store_mapping(mapping) {
            Ok(()) => stored += 1,
            Err(e) => store_error = Some(e),
        }
    })?;

    if let Some(e) = store_error {
        return Err(e);
    }

    tracing::info!(config_id = %config_id, scanned, stored, "imported source mappings");
    Ok(stored)
}
