//! Miniserver data handling on top of `loxly-api`.
//!
//! - **[`StructureScanner`]**: forward-only scan of the XML project file
//!   for `(identifier, title)` source mappings.
//! - **[`import_source_mappings`]**: sanitizes scanned names and records
//!   them through a [`SourceMappingStore`].
//! - **[`FrameDispatcher`]**: routes decoded frames to their decoders and
//!   records configs and events through the store traits.
//! - **[`source_id`]**: durable source IDs for tracked entities.
//! - **Domain model** ([`model`]): configs, events, mappings and the JSON
//!   structure file, each scoped to a [`ConfigId`](loxly_api::ConfigId).

pub mod dispatch;
pub mod error;
pub mod import;
pub mod model;
pub mod scanner;
pub mod source;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use dispatch::{Dispatched, FrameDispatcher};
pub use error::CoreError;
pub use import::import_source_mappings;
pub use scanner::{SourceMappingParser, StructureScanner};
pub use source::{SOURCE_ID_MAX_LEN, max_mapping_len, sanitize_source_id, source_id};
pub use store::{ConfigStore, EventStore, MemoryStore, SourceMappingStore};

pub use model::{
    Category, Config, Control, DaytimerEvent, DaytimerSpan, EventEntity, Forecast, Room,
    SourceMapping, StructureFile, TextEvent, ValueEvent, WeatherEvent,
};
