// ── Structure file entities ──
//
// `LoxAPP3.json` describes rooms, categories and controls, each keyed by
// identifier. Entities that fail to parse or lack a name are skipped with a
// warning so one odd entry never discards the whole file.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use loxly_api::id::deserialize_indexed_ids;
use loxly_api::{ConfigId, Id128};

use super::config::{Config, parse_last_modified};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub uuid: Id128,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rating: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub uuid: Id128,
    pub name: String,
    /// e.g. `lights`, `shading`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rating: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    #[serde(alias = "uuidAction")]
    pub uuid: Id128,
    pub name: String,
    /// Miniserver control type name, e.g. `Switch` or `IRoomController`.
    #[serde(rename = "type")]
    pub control_type: String,
    #[serde(default)]
    pub room: Option<Id128>,
    #[serde(rename = "cat", default)]
    pub category: Option<Id128>,
    /// State name → state identifier. Array-valued states are flattened
    /// to `name[idx]`.
    #[serde(default, deserialize_with = "deserialize_indexed_ids")]
    pub states: BTreeMap<String, Id128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// The parts of `LoxAPP3.json` this workspace tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureFile {
    pub config: Config,
    pub rooms: Vec<Room>,
    pub categories: Vec<Category>,
    pub controls: Vec<Control>,
}

impl StructureFile {
    /// Parse a structure file belonging to `config_id`.
    ///
    /// `lastModified` is required; an unparseable entity is logged and
    /// skipped.
    pub fn parse(config_id: ConfigId, body: &str) -> Result<Self, CoreError> {
        let root: Value = serde_json::from_str(body).map_err(|e| CoreError::Response {
            message: format!("structure file is not JSON: {e}"),
            body: String::new(),
        })?;

        let last_modified = root
            .get("lastModified")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Response {
                message: "structure file has no lastModified".into(),
                body: String::new(),
            })
            .and_then(parse_last_modified)?;

        let rooms: Vec<Room> = entities(&root, "rooms");
        let categories: Vec<Category> = entities(&root, "cats");
        let controls: Vec<Control> = entities(&root, "controls");

        tracing::debug!(
            config_id = %config_id,
            %last_modified,
            rooms = rooms.len(),
            categories = categories.len(),
            controls = controls.len(),
            "parsed structure file"
        );

        Ok(Self {
            config: Config::new(config_id).with_last_modified(last_modified),
            rooms,
            categories,
            controls,
        })
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.config.last_modified
    }

    /// Name of the room `control` is placed in, if known.
    pub fn room_name(&self, control: &Control) -> Option<&str> {
        let room = control.room?;
        self.rooms
            .iter()
            .find(|r| r.uuid == room)
            .map(|r| r.name.as_str())
    }
}

/// Decode every entry of an object or array section, skipping bad ones.
fn entities<T: DeserializeOwned + Named>(root: &Value, section: &str) -> Vec<T> {
    let items: Vec<&Value> = match root.get(section) {
        Some(Value::Object(map)) => map.values().collect(),
        Some(Value::Array(list)) => list.iter().collect(),
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(entity) if !entity.name().trim().is_empty() => Some(entity),
            Ok(_) => {
                tracing::warn!(section, "ignoring entity without a name");
                None
            }
            Err(e) => {
                tracing::warn!(section, error = %e, "ignoring invalid entity");
                None
            }
        })
        .collect()
}

trait Named {
    fn name(&self) -> &str;
}

impl Named for Room {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Control {
    fn name(&self) -> &str {
        &self.name
    }
}
