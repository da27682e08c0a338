use crate::GoalMapEditor;
use goalmap::share::{self, SharedLink};
use goalmap::shortcuts::{self, KeyChord};
use goalmap::{
    Connection, Dispatch, EditorConfig, GraphSnapshot, MapMetadataPatch, NodeData, NodeKind,
    NodePatch, Position, SharedMap, Viewport,
};
use js_sys::{Function, Promise, Reflect};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use crate::error;
use crate::interop::{from_js_or_default, new_obj, set_kv, to_js};
use crate::logging;
use crate::storage::BrowserStore;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Install the console logger at `level` (off, error, warn, info, debug, trace)
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> JsValue {
    match logging::parse_level(level) {
        Some(filter) => {
            logging::init(filter);
            error::ok(JsValue::from_str(level))
        }
        None => error::invalid_arg("level", "expected off, error, warn, info, debug or trace"),
    }
}

fn read_config(config: JsValue) -> EditorConfig {
    from_js_or_default(config).unwrap_or_else(|e| {
        warn!("ignoring invalid editor config: {}", e);
        EditorConfig::default()
    })
}

fn resolve_page_url(explicit: Option<String>) -> Result<String, JsValue> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    let window = web_sys::window().ok_or_else(|| error::unavailable("no_window", "window"))?;
    window
        .location()
        .href()
        .map_err(|_| error::unavailable("no_window", "window.location"))
}

fn write_clipboard(text: &str) -> Result<Promise, JsValue> {
    let global = js_sys::global();
    let navigator = Reflect::get(&global, &JsValue::from_str("navigator"))?;
    let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard"))?;
    let write: Function = Reflect::get(&clipboard, &JsValue::from_str("writeText"))?.dyn_into()?;
    write.call1(&clipboard, &JsValue::from_str(text))?.dyn_into()
}

fn dispatch_value(command: &str, effect: &str) -> JsValue {
    let o = new_obj();
    set_kv(&o, "command", &JsValue::from_str(command));
    set_kv(&o, "effect", &JsValue::from_str(effect));
    o.into()
}

#[wasm_bindgen]
impl GoalMapEditor {
    /// Editor backed by `localStorage`. `config` is an optional plain object
    /// (`historyLimit`, `duplicateOffset`, `copySuffix`, `defaultMapName`).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> GoalMapEditor {
        logging::install_default();
        GoalMapEditor::rs_open(BrowserStore::local_or_memory(), read_config(config))
    }

    /// Editor that keeps everything in memory
    pub fn in_memory(config: JsValue) -> GoalMapEditor {
        logging::install_default();
        GoalMapEditor::rs_in_memory(read_config(config))
    }

    pub fn is_persistent(&self) -> bool {
        self.registry.storage().inner().is_persistent()
    }

    // Graph

    pub fn map_id(&self) -> String {
        self.session.map_id().to_string()
    }

    pub fn graph(&self) -> JsValue {
        to_js(self.session.graph()).unwrap_or(JsValue::NULL)
    }

    pub fn nodes(&self) -> JsValue {
        to_js(&self.session.graph().nodes).unwrap_or(JsValue::NULL)
    }

    pub fn edges(&self) -> JsValue {
        to_js(&self.session.graph().edges).unwrap_or(JsValue::NULL)
    }

    /// Accept a graph edited by the renderer (e.g. React Flow changes) as
    /// one undoable step
    pub fn replace_graph_res(&mut self, graph: JsValue) -> JsValue {
        let graph: GraphSnapshot = match serde_wasm_bindgen::from_value(graph) {
            Ok(g) => g,
            Err(e) => return error::invalid_arg("graph", e),
        };
        if let Err(e) = graph.validate() {
            return error::err("invalid_graph", e.to_string(), None);
        }
        let r = self.session.record_external(graph).map(|_| ());
        if r.is_ok() {
            self.persist();
        }
        error::wrap(r, |_| JsValue::TRUE)
    }

    // Selection

    pub fn selection(&self) -> JsValue {
        to_js(&self.session.selection().to_sorted_vec()).unwrap_or(JsValue::NULL)
    }

    pub fn has_selection(&self) -> bool {
        self.session.selection().has_selection()
    }

    /// Returns whether `id` is selected afterwards
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        self.session.toggle_selection(id)
    }

    pub fn select_all(&mut self) {
        self.session.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    pub fn set_selection_res(&mut self, ids: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<String>>(ids) {
            Ok(ids) => {
                self.session.set_selection(ids);
                error::ok(JsValue::from_f64(self.session.selection().count() as f64))
            }
            Err(e) => error::invalid_arg("ids", e),
        }
    }

    // Edits

    pub fn duplicate_selected_res(&mut self) -> JsValue {
        let r = self.session.duplicate_selected().map(|g| g.nodes.len());
        self.edited(r, |n| JsValue::from_f64(n as f64))
    }

    pub fn duplicate_node_res(&mut self, id: &str) -> JsValue {
        let r = self
            .session
            .duplicate_node(id)
            .map(|g| g.nodes.last().map(|n| n.id.clone()).unwrap_or_default());
        self.edited(r, |id| JsValue::from_str(&id))
    }

    pub fn delete_selected_res(&mut self) -> JsValue {
        let r = self.session.delete_selected().map(|g| g.nodes.len());
        self.edited(r, |n| JsValue::from_f64(n as f64))
    }

    /// Drag step. Not undoable until [`GoalMapEditor::commit_move`].
    pub fn move_selected_res(&mut self, dx: f64, dy: f64) -> JsValue {
        if !dx.is_finite() {
            return error::non_finite("dx");
        }
        if !dy.is_finite() {
            return error::non_finite("dy");
        }
        error::wrap(self.session.move_selected(dx, dy), |_| JsValue::TRUE)
    }

    /// End of a drag: record pending moves as one history step
    pub fn commit_move(&mut self) -> bool {
        let recorded = self.session.commit();
        if recorded {
            self.persist();
        }
        recorded
    }

    pub fn update_selected_res(&mut self, patch: JsValue) -> JsValue {
        let patch: NodePatch = match from_js_or_default(patch) {
            Ok(p) => p,
            Err(e) => return error::invalid_arg("patch", e),
        };
        if patch.is_empty() {
            return error::invalid_arg("patch", "no fields to update");
        }
        let r = self.session.update_selected(&patch).map(|_| ());
        self.edited(r, |_| JsValue::TRUE)
    }

    pub fn add_node_res(&mut self, kind: &str, x: f64, y: f64, data: JsValue) -> JsValue {
        let kind: NodeKind = match serde_wasm_bindgen::from_value(JsValue::from_str(kind)) {
            Ok(k) => k,
            Err(e) => return error::invalid_arg("kind", e),
        };
        if !x.is_finite() {
            return error::non_finite("x");
        }
        if !y.is_finite() {
            return error::non_finite("y");
        }
        let data: NodeData = match from_js_or_default(data) {
            Ok(d) => d,
            Err(e) => return error::invalid_arg("data", e),
        };
        let r = self.session.add_node(kind, Position::new(x, y), data);
        self.edited(r, |id| JsValue::from_str(&id))
    }

    pub fn connect_res(&mut self, connection: JsValue) -> JsValue {
        let conn: Connection = match serde_wasm_bindgen::from_value(connection) {
            Ok(c) => c,
            Err(e) => return error::invalid_arg("connection", e),
        };
        let r = self.session.connect(conn);
        self.edited(r, |id| JsValue::from_str(&id))
    }

    pub fn remove_edge_res(&mut self, id: &str) -> JsValue {
        let r = self.session.remove_edges(&[id.to_string()]).map(|_| ());
        self.edited(r, |_| JsValue::TRUE)
    }

    pub fn remove_node_res(&mut self, id: &str) -> JsValue {
        let r = self.session.remove_nodes(&[id.to_string()]).map(|_| ());
        self.edited(r, |_| JsValue::TRUE)
    }

    // History

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    pub fn undo_res(&mut self) -> JsValue {
        let r = self.session.undo().map(|_| ());
        self.edited(r, |_| JsValue::TRUE)
    }

    pub fn redo_res(&mut self) -> JsValue {
        let r = self.session.redo().map(|_| ());
        self.edited(r, |_| JsValue::TRUE)
    }

    /// Keyboard entry point. `ok(null)` when the key is not a shortcut or a
    /// text field has focus, otherwise `ok({command, effect})`.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        meta: bool,
        shift: bool,
        alt: bool,
        editing_text: bool,
    ) -> JsValue {
        let chord = KeyChord {
            key: key.to_string(),
            ctrl,
            meta,
            shift,
            alt,
        };
        let Some(command) = shortcuts::resolve(&chord, editing_text) else {
            return error::ok(JsValue::NULL);
        };
        debug!("shortcut {:?} -> {}", chord, command.name());
        let r = self.session.dispatch(command);
        let graph_changed = matches!(r, Ok(Dispatch::GraphChanged));
        if graph_changed {
            self.persist();
        }
        error::wrap(r, |d| {
            let effect = match d {
                Dispatch::GraphChanged => "graph",
                Dispatch::SelectionChanged => "selection",
                Dispatch::Delegated(_) => "view",
            };
            dispatch_value(command.name(), effect)
        })
    }

    // Maps

    pub fn maps(&self) -> JsValue {
        to_js(self.registry.maps()).unwrap_or(JsValue::NULL)
    }

    pub fn active_map_id(&self) -> String {
        self.registry.active_map_id().to_string()
    }

    pub fn create_map_res(&mut self, name: &str, description: Option<String>) -> JsValue {
        let r = self.registry.create_map(name, description.as_deref());
        error::wrap(r, |id| JsValue::from_str(&id))
    }

    /// Delete a map. Deleting the active map opens the next one.
    pub fn delete_map_res(&mut self, id: &str) -> JsValue {
        let was_active = self.registry.active_map_id() == id;
        if let Err(e) = self.registry.delete_map(id) {
            return error::from_error(&e);
        }
        if was_active {
            if let Err(e) = self.load_active() {
                return error::from_error(&e);
            }
        }
        error::ok(JsValue::from_str(self.registry.active_map_id()))
    }

    pub fn rename_map_res(&mut self, id: &str, name: &str, description: Option<String>) -> JsValue {
        let r = self.registry.rename_map(id, name, description.as_deref());
        error::wrap(r, |_| JsValue::TRUE)
    }

    pub fn duplicate_map_res(&mut self, id: &str, new_name: &str) -> JsValue {
        if id == self.session.map_id() {
            self.persist();
        }
        let r = self.registry.duplicate_map(id, new_name);
        error::wrap(r, |id| JsValue::from_str(&id))
    }

    /// Save the current map and open `id`
    pub fn switch_map_res(&mut self, id: &str) -> JsValue {
        if !self.registry.contains(id) {
            return error::from_error(&goalmap::RegistryError::UnknownMap(id.to_string()));
        }
        self.persist();
        if let Err(e) = self.registry.set_active_map(id) {
            return error::from_error(&e);
        }
        let r = self.load_active();
        error::wrap(r, |_| JsValue::from_str(id))
    }

    pub fn update_map_metadata_res(&mut self, id: &str, patch: JsValue) -> JsValue {
        let patch: MapMetadataPatch = match from_js_or_default(patch) {
            Ok(p) => p,
            Err(e) => return error::invalid_arg("patch", e),
        };
        let r = self.registry.update_map_metadata(id, patch);
        error::wrap(r, |_| JsValue::TRUE)
    }

    /// Write the active graph and retry any pending registry writes
    pub fn save_res(&mut self) -> JsValue {
        let id = self.session.map_id().to_string();
        if let Err(e) = self.registry.save_graph(&id, self.session.graph()) {
            return error::from_error(&e);
        }
        error::wrap(self.registry.flush(), |_| JsValue::TRUE)
    }

    pub fn is_synced(&self) -> bool {
        self.registry.is_synced()
    }

    pub fn last_sync_error(&self) -> Option<String> {
        self.registry.last_sync_error().map(|e| e.to_string())
    }

    pub fn viewport_res(&self) -> JsValue {
        match self.registry.load_viewport(self.session.map_id()) {
            Ok(v) => error::ok_value(&v),
            Err(e) => error::from_error(&e),
        }
    }

    pub fn save_viewport_res(&mut self, x: f64, y: f64, zoom: f64) -> JsValue {
        for (name, v) in [("x", x), ("y", y), ("zoom", zoom)] {
            if !v.is_finite() {
                return error::non_finite(name);
            }
        }
        let id = self.session.map_id().to_string();
        let r = self.registry.save_viewport(&id, &Viewport { x, y, zoom });
        error::wrap(r, |_| JsValue::TRUE)
    }

    // Sharing

    pub fn share_token_res(&self) -> JsValue {
        error::wrap(share::encode(&self.shared_map()), |t| JsValue::from_str(&t))
    }

    /// Read-only link to the active map. `page_url` defaults to the current
    /// location.
    pub fn share_link_res(&self, page_url: Option<String>) -> JsValue {
        let base = match resolve_page_url(page_url) {
            Ok(u) => u,
            Err(e) => return e,
        };
        error::wrap(share::share_link(&base, &self.shared_map()), |u| {
            JsValue::from_str(u.as_str())
        })
    }

    /// Copy the share link to the clipboard. `ok(Promise)` resolving when
    /// the browser accepted the text.
    pub fn copy_share_link(&self, page_url: Option<String>) -> JsValue {
        let base = match resolve_page_url(page_url) {
            Ok(u) => u,
            Err(e) => return e,
        };
        let link = match share::share_link(&base, &self.shared_map()) {
            Ok(u) => u,
            Err(e) => return error::from_error(&e),
        };
        match write_clipboard(link.as_str()) {
            Ok(p) => error::ok(p.into()),
            Err(_) => error::unavailable("clipboard_unavailable", "navigator.clipboard"),
        }
    }

    pub fn decode_share_res(&self, token: &str) -> JsValue {
        match share::decode(token) {
            Ok(m) => error::ok_value(&m),
            Err(e) => error::from_error(&e),
        }
    }

    /// Save a shared token as a new map and open it
    pub fn import_shared_res(&mut self, token: &str) -> JsValue {
        let shared = match share::decode(token) {
            Ok(m) => m,
            Err(e) => return error::from_error(&e),
        };
        let id = match self.registry.import_shared(&shared) {
            Ok(id) => id,
            Err(e) => return error::from_error(&e),
        };
        self.switch_map_res(&id)
    }

    /// Share parameters of the current page: `ok(null)` when absent,
    /// otherwise `ok({map, viewOnly})`
    pub fn shared_from_location(&self, page_url: Option<String>) -> JsValue {
        let url = match resolve_page_url(page_url) {
            Ok(u) => u,
            Err(e) => return e,
        };
        let link = match SharedLink::parse(&url) {
            Ok(Some(link)) => link,
            Ok(None) => return error::ok(JsValue::NULL),
            Err(e) => return error::from_error(&e),
        };
        let map = match link.decode().map_err(|e| error::from_error(&e)).and_then(|m| {
            to_js(&m).map_err(|e| error::err("serialize", e.to_string(), None))
        }) {
            Ok(m) => m,
            Err(e) => return e,
        };
        let o = new_obj();
        set_kv(&o, "map", &map);
        set_kv(&o, "viewOnly", &JsValue::from_bool(link.view_only));
        error::ok(o.into())
    }
}

impl GoalMapEditor {
    fn edited<T>(&mut self, r: Result<T, goalmap::SessionError>, f: impl FnOnce(T) -> JsValue) -> JsValue {
        if r.is_ok() {
            self.persist();
        }
        error::wrap(r, f)
    }

    fn shared_map(&self) -> SharedMap {
        let (name, description) = match self.registry.get(self.session.map_id()) {
            Some(m) => (m.name.clone(), m.description.clone()),
            None => (self.session.config().default_map_name.clone(), None),
        };
        SharedMap::new(name, description, self.session.graph().clone())
    }
}

impl Default for GoalMapEditor {
    fn default() -> Self {
        GoalMapEditor::rs_in_memory(EditorConfig::default())
    }
}
