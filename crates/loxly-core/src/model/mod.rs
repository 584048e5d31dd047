// ── Domain model ──
//
// Canonical representations of Miniserver data as this workspace tracks it.
// Every entity is scoped to the ConfigId of the Miniserver it came from.

pub mod config;
pub mod event;
pub mod source_mapping;
pub mod structure;

// ── Re-exports ──────────────────────────────────────────────────────

pub use config::{Config, LAST_MODIFIED_FORMAT, parse_last_modified};
pub use event::{
    DaytimerEvent, DaytimerSpan, EventEntity, Forecast, TextEvent, ValueEvent, WeatherEvent,
};
pub use source_mapping::SourceMapping;
pub use structure::{Category, Control, Room, StructureFile};
