//! Wire protocol for Loxone Miniserver WebSocket connections.
//!
//! Everything here is a pure function over already-buffered bytes or text;
//! transport and session lifecycle live elsewhere.
//!
//! - **[`MessageHeader`]**: the 8-byte header announcing every frame.
//! - **[`CommandKind`]**: closed set of commands, resolved from request
//!   and response spellings. [`CommandResponse`] parses the JSON reply.
//! - **[`Id128`]** / **[`ConfigId`]** / **[`TokenPermissions`]**:
//!   identifier codecs with the Miniserver's non-standard text forms.
//! - **[`ApiVersion`]**: firmware version gate.
//! - **[`event`]**: binary event-table decoders.

pub mod command;
pub mod config_id;
pub mod error;
pub mod event;
pub mod header;
pub mod id;
pub mod permission;
pub mod version;

pub use command::{CommandKind, CommandResponse};
pub use config_id::ConfigId;
pub use error::Error;
pub use event::{
    DaytimerEntry, DaytimerState, MINUTES_PER_DAY, TextState, ValueState, WeatherEntry,
    WeatherState,
};
pub use header::{HEADER_LEN, MessageHeader, MessageInfo, MessageKind};
pub use id::Id128;
pub use permission::TokenPermissions;
pub use version::{ApiInfo, ApiVersion};
