// ── Persistence seams ──
//
// The core produces and consumes values; where they live is the caller's
// business. These traits are the narrow store/load-by-key surface the
// import and dispatch paths need. `MemoryStore` backs tests and the CLI.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;

use loxly_api::{ConfigId, Id128};

use crate::error::CoreError;
use crate::model::{Config, EventEntity, SourceMapping, TextEvent, ValueEvent};

pub trait ConfigStore: Send + Sync {
    fn load_config(&self, id: ConfigId) -> Result<Option<Config>, CoreError>;
    fn store_config(&self, config: Config) -> Result<(), CoreError>;
}

pub trait SourceMappingStore: Send + Sync {
    /// Insert or replace the mapping for `(config_id, uuid)`.
    fn store_mapping(&self, mapping: SourceMapping) -> Result<(), CoreError>;
    fn load_mapping(
        &self,
        config_id: ConfigId,
        uuid: Id128,
    ) -> Result<Option<SourceMapping>, CoreError>;
    fn mappings_for_config(&self, config_id: ConfigId) -> Result<Vec<SourceMapping>, CoreError>;
    /// Returns the number of mappings removed.
    fn delete_mappings_for_config(&self, config_id: ConfigId) -> Result<usize, CoreError>;
}

pub trait EventStore<T: EventEntity>: Send + Sync {
    fn load_event(&self, config_id: ConfigId, uuid: Id128) -> Result<Option<T>, CoreError>;
    /// Insert or replace the latest event for the entity.
    fn store_event(&self, event: T) -> Result<(), CoreError>;
}

// ── MemoryStore ─────────────────────────────────────────────────────

type Key = (ConfigId, Id128);

/// Concurrent in-memory store over `DashMap`s.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    configs: DashMap<ConfigId, Config>,
    mappings: DashMap<Key, SourceMapping>,
    values: DashMap<Key, ValueEvent>,
    texts: DashMap<Key, TextEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config IDs that have at least one stored mapping.
    pub fn mapped_configs(&self) -> BTreeSet<ConfigId> {
        self.inner.mappings.iter().map(|r| r.key().0).collect()
    }

    pub fn value_event_count(&self) -> usize {
        self.inner.values.len()
    }

    pub fn text_event_count(&self) -> usize {
        self.inner.texts.len()
    }
}

impl ConfigStore for MemoryStore {
    fn load_config(&self, id: ConfigId) -> Result<Option<Config>, CoreError> {
        Ok(self.inner.configs.get(&id).map(|r| r.value().clone()))
    }

    fn store_config(&self, config: Config) -> Result<(), CoreError> {
        self.inner.configs.insert(config.id, config);
        Ok(())
    }
}

impl SourceMappingStore for MemoryStore {
    fn store_mapping(&self, mapping: SourceMapping) -> Result<(), CoreError> {
        let config_id = mapping.config_id.ok_or_else(|| CoreError::Store {
            message: format!("mapping for {} has no config ID", mapping.uuid),
        })?;
        self.inner
            .mappings
            .insert((config_id, mapping.uuid), mapping);
        Ok(())
    }

    fn load_mapping(
        &self,
        config_id: ConfigId,
        uuid: Id128,
    ) -> Result<Option<SourceMapping>, CoreError> {
        Ok(self
            .inner
            .mappings
            .get(&(config_id, uuid))
            .map(|r| r.value().clone()))
    }

    fn mappings_for_config(&self, config_id: ConfigId) -> Result<Vec<SourceMapping>, CoreError> {
        let mut found: Vec<SourceMapping> = self
            .inner
            .mappings
            .iter()
            .filter(|r| r.key().0 == config_id)
            .map(|r| r.value().clone())
            .collect();
        found.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(found)
    }

    fn delete_mappings_for_config(&self, config_id: ConfigId) -> Result<usize, CoreError> {
        let before = self.inner.mappings.len();
        self.inner.mappings.retain(|key, _| key.0 != config_id);
        Ok(before - self.inner.mappings.len())
    }
}

impl EventStore<ValueEvent> for MemoryStore {
    fn load_event(&self, config_id: ConfigId, uuid: Id128) -> Result<Option<ValueEvent>, CoreError> {
        Ok(self
            .inner
            .values
            .get(&(config_id, uuid))
            .map(|r| r.value().clone()))
    }

    fn store_event(&self, event: ValueEvent) -> Result<(), CoreError> {
        self.inner
            .values
            .insert((event.config_id(), event.uuid()), event);
        Ok(())
    }
}

impl EventStore<TextEvent> for MemoryStore {
    fn load_event(&self, config_id: ConfigId, uuid: Id128) -> Result<Option<TextEvent>, CoreError> {
        Ok(self
            .inner
            .texts
            .get(&(config_id, uuid))
            .map(|r| r.value().clone()))
    }

    fn store_event(&self, event: TextEvent) -> Result<(), CoreError> {
        self.inner
            .texts
            .insert((event.config_id(), event.uuid()), event);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mapping(config: u64, n: u128, name: &str) -> SourceMapping {
        SourceMapping::new(Id128::from_u128(n), name).with_config_id(ConfigId::new(config))
    }

    #[test]
    fn mappings_are_scoped_by_config() {
        let store = MemoryStore::new();
        store.store_mapping(mapping(1, 2, "b")).unwrap();
        store.store_mapping(mapping(1, 1, "a")).unwrap();
        store.store_mapping(mapping(2, 1, "other")).unwrap();

        let names: Vec<String> = store
            .mappings_for_config(ConfigId::new(1))
            .unwrap()
            .into_iter()
            .map(|m| m.source_id)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        assert_eq!(store.delete_mappings_for_config(ConfigId::new(1)).unwrap(), 2);
        assert_eq!(
            store.mapped_configs().into_iter().collect::<Vec<_>>(),
            vec![ConfigId::new(2)]
        );
    }

    #[test]
    fn mapping_without_config_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .store_mapping(SourceMapping::new(Id128::NIL, "x"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Store { .. }));
    }

    #[test]
    fn latest_event_replaces_previous() {
        let store = MemoryStore::new();
        let config = ConfigId::new(9);
        let uuid = Id128::from_u128(5);
        for value in [1.0, 2.0] {
            EventStore::<ValueEvent>::store_event(
                &store,
                ValueEvent {
                    config_id: config,
                    uuid,
                    created: Utc::now(),
                    value,
                },
            )
            .unwrap();
        }
        let latest = EventStore::<ValueEvent>::load_event(&store, config, uuid)
            .unwrap()
            .unwrap();
        assert!(latest.same_value(2.0));
        assert_eq!(store.value_event_count(), 1);
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.store_config(Config::new(ConfigId::new(3))).unwrap();
        assert!(view.load_config(ConfigId::new(3)).unwrap().is_some());
    }
}
