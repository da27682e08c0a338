//! Metadata and storage routing for multiple goal maps.
//!
//! The registry owns the list of [`MapMetadata`] and the active map id.
//! In-memory state is authoritative: every change is applied in memory first
//! and then written through to the store. Failed writes are logged, kept
//! pending and retried on the next write or an explicit [`MapRegistry::flush`].

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::clock::{Clock, SystemClock};
use crate::config::{DEFAULT_MAP_ID, DEFAULT_MAP_NAME};
use crate::error::{RegistryError, StoreError};
use crate::ids::{fresh_id, IdGenerator, UuidIds};
use crate::model::{GraphSnapshot, Viewport};
use crate::share::SharedMap;
use crate::store::{keys, KeyValueStore, MapStorage};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub node_count: usize,
}

/// Metadata fields to overwrite; `None` leaves a field unchanged
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapMetadataPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub node_count: Option<usize>,
}

#[derive(Debug, Default)]
struct Pending {
    metadata: bool,
    active: bool,
    deletions: BTreeSet<String>,
    /// Maps whose last graph write failed. Only a later successful
    /// `save_graph` for the same map clears an entry.
    graphs: BTreeSet<String>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        !self.metadata && !self.active && self.deletions.is_empty() && self.graphs.is_empty()
    }
}

pub struct MapRegistry<S> {
    storage: MapStorage<S>,
    maps: Vec<MapMetadata>,
    active: String,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    pending: Pending,
    last_sync_error: Option<StoreError>,
}

impl<S: KeyValueStore> MapRegistry<S> {
    pub fn open(store: S) -> Self {
        MapRegistry::open_with(store, Box::new(UuidIds), Box::new(SystemClock))
    }

    /// Load metadata and the active id, seeding the default map when nothing
    /// is stored yet.
    pub fn open_with(store: S, ids: Box<dyn IdGenerator>, clock: Box<dyn Clock>) -> Self {
        MapRegistry::open_named(store, ids, clock, DEFAULT_MAP_NAME)
    }

    /// Like [`MapRegistry::open_with`], naming a freshly seeded default map
    /// `default_name`
    pub fn open_named(
        store: S,
        ids: Box<dyn IdGenerator>,
        clock: Box<dyn Clock>,
        default_name: &str,
    ) -> Self {
        let storage = MapStorage::new(store);
        let mut last_sync_error = None;
        let maps = match storage.load_metadata() {
            Ok(Some(maps)) => maps,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("could not load map metadata, starting fresh: {}", e);
                last_sync_error = Some(e);
                Vec::new()
            }
        };
        let stored_active = match storage.load_active() {
            Ok(active) => active,
            Err(e) => {
                warn!("could not load active map id: {}", e);
                None
            }
        };
        let mut registry = MapRegistry {
            storage,
            maps,
            active: String::new(),
            ids,
            clock,
            pending: Pending::default(),
            last_sync_error,
        };
        if registry.maps.is_empty() {
            let now = registry.clock.now();
            registry.maps.push(MapMetadata {
                id: DEFAULT_MAP_ID.to_string(),
                name: default_name.to_string(),
                description: None,
                created_at: now,
                last_modified: now,
                node_count: 0,
            });
            registry.pending.metadata = true;
        }
        registry.active = match stored_active {
            Some(id) if registry.contains(&id) => id,
            _ => {
                registry.pending.active = true;
                registry.maps[0].id.clone()
            }
        };
        registry.sync();
        registry
    }

    pub fn maps(&self) -> &[MapMetadata] {
        &self.maps
    }

    pub fn get(&self, id: &str) -> Option<&MapMetadata> {
        self.maps.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn active_map_id(&self) -> &str {
        &self.active
    }

    pub fn active_map(&self) -> Option<&MapMetadata> {
        self.get(&self.active)
    }

    pub fn storage(&self) -> &MapStorage<S> {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut MapStorage<S> {
        &mut self.storage
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut MapMetadata, RegistryError> {
        self.maps
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| RegistryError::UnknownMap(id.to_string()))
    }

    fn fresh_map_id(&mut self) -> Result<String, RegistryError> {
        let mut taken: HashSet<String> = self.maps.iter().map(|m| m.id.clone()).collect();
        taken.extend(self.pending.deletions.iter().cloned());
        fresh_id(self.ids.as_mut(), &mut taken).map_err(|_| RegistryError::IdExhausted)
    }

    /// Create an empty map, returns its id
    pub fn create_map(&mut self, name: &str, description: Option<&str>) -> Result<String, RegistryError> {
        let id = self.fresh_map_id()?;
        let now = self.clock.now();
        self.maps.push(MapMetadata {
            id: id.clone(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            last_modified: now,
            node_count: 0,
        });
        debug!("created map {} ({})", id, name);
        self.pending.metadata = true;
        self.sync();
        Ok(id)
    }

    /// Delete a map and its stored graph and viewport. The last remaining
    /// map cannot be deleted. Deleting the active map activates the first
    /// remaining one.
    pub fn delete_map(&mut self, id: &str) -> Result<(), RegistryError> {
        let idx = self
            .maps
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| RegistryError::UnknownMap(id.to_string()))?;
        if self.maps.len() == 1 {
            return Err(RegistryError::LastMap);
        }
        self.maps.remove(idx);
        self.pending.metadata = true;
        self.pending.deletions.insert(id.to_string());
        self.pending.graphs.remove(id);
        if self.active == id {
            self.active = self.maps[0].id.clone();
            self.pending.active = true;
        }
        debug!("deleted map {}", id);
        self.sync();
        Ok(())
    }

    pub fn rename_map(
        &mut self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), RegistryError> {
        self.update_map_metadata(
            id,
            MapMetadataPatch {
                name: Some(name.to_string()),
                description: description.map(str::to_string),
                node_count: None,
            },
        )
    }

    /// Copy a map's stored graph and viewport under a new id. The node count
    /// is taken from the source metadata, not recounted.
    pub fn duplicate_map(&mut self, id: &str, new_name: &str) -> Result<String, RegistryError> {
        let source = self
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownMap(id.to_string()))?;
        let new_id = self.fresh_map_id()?;
        if let Err(e) = self.storage.copy_map_data(id, &new_id) {
            self.discard_map_data(&new_id);
            return Err(e.into());
        }
        let now = self.clock.now();
        self.maps.push(MapMetadata {
            id: new_id.clone(),
            name: new_name.to_string(),
            description: source.description,
            created_at: now,
            last_modified: now,
            node_count: source.node_count,
        });
        self.pending.metadata = true;
        self.sync();
        Ok(new_id)
    }

    /// Switch the active map. Unknown ids are rejected.
    pub fn set_active_map(&mut self, id: &str) -> Result<(), RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownMap(id.to_string()));
        }
        if self.active != id {
            self.active = id.to_string();
            self.pending.active = true;
            self.sync();
        }
        Ok(())
    }

    pub fn update_map_metadata(
        &mut self,
        id: &str,
        patch: MapMetadataPatch,
    ) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let meta = self.get_mut(id)?;
        if let Some(name) = patch.name {
            meta.name = name;
        }
        if let Some(description) = patch.description {
            meta.description = Some(description);
        }
        if let Some(count) = patch.node_count {
            meta.node_count = count;
        }
        meta.last_modified = now;
        self.pending.metadata = true;
        self.sync();
        Ok(())
    }

    pub fn load_graph(&self, id: &str) -> Result<GraphSnapshot, RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownMap(id.to_string()));
        }
        Ok(self.storage.load_graph(id)?)
    }

    /// Persist a map's graph and refresh its cached node count
    pub fn save_graph(&mut self, id: &str, graph: &GraphSnapshot) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let meta = self.get_mut(id)?;
        meta.node_count = graph.nodes.len();
        meta.last_modified = now;
        self.pending.metadata = true;
        match self.storage.save_graph(id, graph) {
            Ok(()) => {
                self.pending.graphs.remove(id);
                self.sync();
                Ok(())
            }
            Err(e) => {
                warn!("graph for map {} not saved: {}", id, e);
                self.pending.graphs.insert(id.to_string());
                self.sync();
                Err(e.into())
            }
        }
    }

    pub fn load_viewport(&self, id: &str) -> Result<Viewport, RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownMap(id.to_string()));
        }
        Ok(self.storage.load_viewport(id)?)
    }

    pub fn save_viewport(&mut self, id: &str, viewport: &Viewport) -> Result<(), RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownMap(id.to_string()));
        }
        Ok(self.storage.save_viewport(id, viewport)?)
    }

    /// Store `shared` as a new map. The map is registered only once its
    /// graph is written; on failure nothing of it remains.
    pub fn import_shared(&mut self, shared: &SharedMap) -> Result<String, RegistryError> {
        let id = self.fresh_map_id()?;
        let graph = shared.graph();
        if let Err(e) = self.storage.save_graph(&id, &graph) {
            self.discard_map_data(&id);
            return Err(e.into());
        }
        let now = self.clock.now();
        self.maps.push(MapMetadata {
            id: id.clone(),
            name: shared.name.clone(),
            description: shared.description.clone(),
            created_at: now,
            last_modified: now,
            node_count: graph.nodes.len(),
        });
        self.pending.metadata = true;
        self.sync();
        Ok(id)
    }

    /// Best-effort removal of keys left by a half-finished write.
    fn discard_map_data(&mut self, id: &str) {
        if let Err(e) = self.storage.delete_map_data(id) {
            warn!("could not clean up data for map {}: {}", id, e);
        }
    }

    pub fn is_synced(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn last_sync_error(&self) -> Option<&StoreError> {
        self.last_sync_error.as_ref()
    }

    /// Retry pending writes, reporting the first failure
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.try_sync()
    }

    fn sync(&mut self) {
        if let Err(e) = self.try_sync() {
            warn!("map registry write failed, will retry: {}", e);
            self.last_sync_error = Some(e);
        }
    }

    fn try_sync(&mut self) -> Result<(), StoreError> {
        let deletions: Vec<String> = self.pending.deletions.iter().cloned().collect();
        for id in deletions {
            self.storage.delete_map_data(&id)?;
            self.pending.deletions.remove(&id);
        }
        if self.pending.metadata {
            self.storage.save_metadata(&self.maps)?;
            self.pending.metadata = false;
        }
        if self.pending.active {
            self.storage.save_active(&self.active)?;
            self.pending.active = false;
        }
        if let Some(id) = self.pending.graphs.iter().next() {
            return Err(StoreError::Write {
                key: keys::nodes(id),
                message: "graph changes not saved".to_string(),
            });
        }
        self.last_sync_error = None;
        Ok(())
    }
}
