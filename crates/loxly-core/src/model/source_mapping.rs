// ── Source mapping ──

use serde::{Deserialize, Serialize};

use loxly_api::{ConfigId, Id128};

/// A friendly source ID for an entity, as found in the structure file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceMapping {
    /// Owning configuration; unset while the mapping is only scanned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_id: Option<ConfigId>,
    pub uuid: Id128,
    pub source_id: String,
}

impl SourceMapping {
    pub fn new(uuid: Id128, source_id: impl Into<String>) -> Self {
        Self {
            config_id: None,
            uuid,
            source_id: source_id.into(),
        }
    }

    pub fn with_config_id(self, config_id: ConfigId) -> Self {
        Self {
            config_id: Some(config_id),
            ..self
        }
    }
}
