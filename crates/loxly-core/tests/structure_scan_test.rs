#![allow(clippy::unwrap_used)]

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use loxly_api::{ConfigId, Id128};
use loxly_core::{
    MemoryStore, SourceMapping, SourceMappingStore, StructureScanner, import_source_mappings,
};

fn fixture() -> BufReader<File> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/structure.xml");
    BufReader::new(File::open(path).unwrap())
}

fn id(suffix: &str) -> Id128 {
    format!("0e839a0b-00d8-1ab1-ffffa1b98ee6c7{suffix}")
        .parse()
        .unwrap()
}

// ── Scanning ────────────────────────────────────────────────────────

#[test]
fn project_file_yields_program_controls() {
    let mut found: Vec<SourceMapping> = Vec::new();
    let count = StructureScanner::new()
        .scan(fixture(), |m| found.push(m))
        .unwrap();

    assert_eq!(count, 5);
    assert_eq!(found.len(), count);
    assert!(found.iter().all(|m| !m.source_id.is_empty()));

    let titles: Vec<&str> = found.iter().map(|m| m.source_id.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Relay extension",
            "Outdoor temperature",
            "Kitchen lights",
            "Motion",
            "Living room blinds",
        ]
    );
    assert_eq!(found[2].uuid, id("21"));
}

// ── Import ──────────────────────────────────────────────────────────

#[test]
fn import_stores_sanitized_names() {
    let store = MemoryStore::new();
    let config = ConfigId::from_external("Home").unwrap();

    let stored = import_source_mappings(fixture(), &StructureScanner::new(), config, &store).unwrap();
    assert_eq!(stored, 5);

    let names: Vec<String> = store
        .mappings_for_config(config)
        .unwrap()
        .into_iter()
        .map(|m| m.source_id)
        .collect();
    assert_eq!(
        names,
        vec![
            "Relayextension",
            "Outdoortemperature",
            "Kitchenlights",
            "Motion",
            "Livingroomblinds",
        ]
    );
}

#[test]
fn reimport_replaces_existing_mappings() {
    let store = MemoryStore::new();
    let config = ConfigId::new(7);
    let scanner = StructureScanner::new();

    import_source_mappings(fixture(), &scanner, config, &store).unwrap();
    import_source_mappings(fixture(), &scanner, config, &store).unwrap();

    assert_eq!(store.mappings_for_config(config).unwrap().len(), 5);
    assert_eq!(store.delete_mappings_for_config(config).unwrap(), 5);
    assert!(store.load_mapping(config, id("23")).unwrap().is_none());
}
