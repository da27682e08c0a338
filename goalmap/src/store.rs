//! Persistence boundary.
//!
//! Maps are stored as JSON strings under well-known keys in a flat string
//! key/value store, the shape of browser `localStorage`. [`MemoryStore`]
//! backs tests and native use; the wasm crate supplies a `localStorage`
//! implementation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::StoreError;
use crate::model::{GraphEdge, GraphNode, GraphSnapshot, Viewport};
use crate::registry::MapMetadata;

pub mod keys {
    pub const METADATA: &str = "goal-maps";
    pub const ACTIVE: &str = "goal-maps-active";

    pub fn nodes(map_id: &str) -> String {
        format!("goal-map-nodes-{}", map_id)
    }

    pub fn edges(map_id: &str) -> String {
        format!("goal-map-edges-{}", map_id)
    }

    pub fn viewport(map_id: &str) -> String {
        format!("goal-map-viewport-{}", map_id)
    }

    /// Every key holding data for one map
    pub fn map_scoped(map_id: &str) -> [String; 3] {
        [nodes(map_id), edges(map_id), viewport(map_id)]
    }
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Keys listed in `failing` reject writes, for exercising
/// persistence failure paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    failing: BTreeSet<String>,
    fail_all_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn fail_writes_to(&mut self, key: impl Into<String>) {
        self.failing.insert(key.into());
    }

    pub fn set_fail_all_writes(&mut self, fail: bool) {
        self.fail_all_writes = fail;
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
        self.fail_all_writes = false;
    }

    fn check_write(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_all_writes || self.failing.contains(key) {
            return Err(StoreError::Write {
                key: key.to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_write(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.check_write(key)?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Typed JSON access to map data in a [`KeyValueStore`]
#[derive(Debug)]
pub struct MapStorage<S> {
    kv: S,
}

impl<S: KeyValueStore> MapStorage<S> {
    pub fn new(kv: S) -> Self {
        MapStorage { kv }
    }

    pub fn inner(&self) -> &S {
        &self.kv
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.kv.get(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::Write {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.kv.set(key, &raw)
    }

    pub fn load_metadata(&self) -> Result<Option<Vec<MapMetadata>>, StoreError> {
        self.read(keys::METADATA)
    }

    pub fn save_metadata(&mut self, maps: &[MapMetadata]) -> Result<(), StoreError> {
        self.write(keys::METADATA, maps)
    }

    pub fn load_active(&self) -> Result<Option<String>, StoreError> {
        self.kv.get(keys::ACTIVE)
    }

    pub fn save_active(&mut self, map_id: &str) -> Result<(), StoreError> {
        self.kv.set(keys::ACTIVE, map_id)
    }

    /// Missing entries load as an empty graph
    pub fn load_graph(&self, map_id: &str) -> Result<GraphSnapshot, StoreError> {
        let nodes: Vec<GraphNode> = self.read(&keys::nodes(map_id))?.unwrap_or_default();
        let edges: Vec<GraphEdge> = self.read(&keys::edges(map_id))?.unwrap_or_default();
        Ok(GraphSnapshot { nodes, edges })
    }

    pub fn save_graph(&mut self, map_id: &str, graph: &GraphSnapshot) -> Result<(), StoreError> {
        self.write(&keys::nodes(map_id), &graph.nodes)?;
        self.write(&keys::edges(map_id), &graph.edges)
    }

    pub fn load_viewport(&self, map_id: &str) -> Result<Viewport, StoreError> {
        Ok(self.read(&keys::viewport(map_id))?.unwrap_or_default())
    }

    pub fn save_viewport(&mut self, map_id: &str, viewport: &Viewport) -> Result<(), StoreError> {
        self.write(&keys::viewport(map_id), viewport)
    }

    /// Copy stored map data verbatim; absent keys stay absent in the target
    pub fn copy_map_data(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        for (src, dst) in keys::map_scoped(from).iter().zip(keys::map_scoped(to).iter()) {
            if let Some(raw) = self.kv.get(src)? {
                self.kv.set(dst, &raw)?;
            }
        }
        Ok(())
    }

    /// Remove nodes, edges and viewport for `map_id`. Attempts every key and
    /// reports the first failure.
    pub fn delete_map_data(&mut self, map_id: &str) -> Result<(), StoreError> {
        let mut first_err = None;
        for key in keys::map_scoped(map_id) {
            if let Err(e) = self.kv.remove(&key) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeData, NodeKind, Position};

    fn graph() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![GraphNode::new("n1", NodeKind::Goal, Position::new(1.0, 2.0), NodeData::titled("A"))],
            vec![],
        )
    }

    #[test]
    fn test_graph_and_viewport_roundtrip_through_keys() {
        let mut s = MapStorage::new(MemoryStore::new());
        s.save_graph("m", &graph()).unwrap();
        s.save_viewport("m", &Viewport { x: 3.0, y: 4.0, zoom: 0.5 }).unwrap();
        assert!(s.inner().contains("goal-map-nodes-m"));
        assert!(s.inner().contains("goal-map-edges-m"));
        assert_eq!(s.load_graph("m").unwrap(), graph());
        assert_eq!(s.load_viewport("m").unwrap().zoom, 0.5);
    }

    #[test]
    fn test_missing_data_loads_empty() {
        let s = MapStorage::new(MemoryStore::new());
        assert!(s.load_graph("nope").unwrap().is_empty());
        assert_eq!(s.load_viewport("nope").unwrap(), Viewport::default());
        assert!(s.load_metadata().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_value_is_reported() {
        let mut kv = MemoryStore::new();
        kv.set("goal-map-nodes-m", "{not json").unwrap();
        let s = MapStorage::new(kv);
        let err = s.load_graph("m").unwrap_err();
        assert_eq!(err.code(), "storage_corrupt");
    }

    #[test]
    fn test_delete_map_data_removes_all_scoped_keys() {
        let mut s = MapStorage::new(MemoryStore::new());
        s.save_graph("m", &graph()).unwrap();
        s.save_viewport("m", &Viewport::default()).unwrap();
        s.save_graph("other", &graph()).unwrap();
        s.delete_map_data("m").unwrap();
        let left: Vec<&str> = s.inner().keys().collect();
        assert_eq!(left, vec!["goal-map-edges-other", "goal-map-nodes-other"]);
    }

    #[test]
    fn test_write_failure_surfaces() {
        let mut kv = MemoryStore::new();
        kv.fail_writes_to("goal-map-edges-m");
        let mut s = MapStorage::new(kv);
        let err = s.save_graph("m", &graph()).unwrap_err();
        assert!(matches!(err, StoreError::Write { ref key, .. } if key == "goal-map-edges-m"));
    }
}
