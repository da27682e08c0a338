use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;
mod logging;
mod storage;

pub use api::{set_log_level, set_panic_hook};

use goalmap::clock::SystemClock;
use goalmap::{EditingSession, EditorConfig, MapRegistry, MemoryStore, UuidIds};
use log::warn;
use storage::BrowserStore;

/// Editing session for the active goal map plus the registry of all maps
#[wasm_bindgen]
pub struct GoalMapEditor {
    pub(crate) registry: MapRegistry<BrowserStore>,
    pub(crate) session: EditingSession,
}

impl GoalMapEditor {
    pub(crate) fn rs_open(store: BrowserStore, config: EditorConfig) -> GoalMapEditor {
        let config = config.validated();
        let registry = MapRegistry::open_named(
            store,
            Box::new(UuidIds),
            Box::new(SystemClock),
            &config.default_map_name,
        );
        let active = registry.active_map_id().to_string();
        let graph = registry.load_graph(&active).unwrap_or_else(|e| {
            warn!("could not load map {}, starting empty: {}", active, e);
            Default::default()
        });
        GoalMapEditor {
            session: EditingSession::new(active, graph, config),
            registry,
        }
    }

    pub(crate) fn rs_in_memory(config: EditorConfig) -> GoalMapEditor {
        GoalMapEditor::rs_open(BrowserStore::Memory(MemoryStore::new()), config)
    }

    /// Write the live graph of the active map, logging failures
    pub(crate) fn persist(&mut self) {
        let id = self.session.map_id().to_string();
        if let Err(e) = self.registry.save_graph(&id, self.session.graph()) {
            warn!("autosave of map {} failed: {}", id, e);
        }
    }

    /// Point the session at the registry's active map. An unreadable map
    /// opens empty and the read error is returned.
    pub(crate) fn load_active(&mut self) -> Result<(), goalmap::RegistryError> {
        let id = self.registry.active_map_id().to_string();
        match self.registry.load_graph(&id) {
            Ok(graph) => {
                self.session.replace_graph(id, graph);
                Ok(())
            }
            Err(e) => {
                warn!("could not load map {}: {}", id, e);
                self.session.replace_graph(id, Default::default());
                Err(e)
            }
        }
    }
}
