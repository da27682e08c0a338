use goalmap::{KeyValueStore, MemoryStore, StoreError};
use log::warn;
use wasm_bindgen::JsValue;
use web_sys::Storage;

fn js_message(v: &JsValue) -> String {
    v.as_string().unwrap_or_else(|| format!("{:?}", v))
}

/// `window.localStorage`, or an in-memory map when the page has none
/// (private browsing, workers, tests)
pub enum BrowserStore {
    Local(Storage),
    Memory(MemoryStore),
}

impl BrowserStore {
    pub fn local_or_memory() -> BrowserStore {
        let storage = web_sys::window().map(|w| w.local_storage());
        match storage {
            Some(Ok(Some(s))) => BrowserStore::Local(s),
            Some(Err(e)) => {
                warn!("localStorage rejected access, maps will not persist: {}", js_message(&e));
                BrowserStore::Memory(MemoryStore::new())
            }
            _ => {
                warn!("localStorage unavailable, maps will not persist");
                BrowserStore::Memory(MemoryStore::new())
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, BrowserStore::Local(_))
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            BrowserStore::Local(s) => s.get_item(key).map_err(|e| StoreError::Read {
                key: key.to_string(),
                message: js_message(&e),
            }),
            BrowserStore::Memory(m) => m.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            BrowserStore::Local(s) => s.set_item(key, value).map_err(|e| StoreError::Write {
                key: key.to_string(),
                message: js_message(&e),
            }),
            BrowserStore::Memory(m) => m.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match self {
            BrowserStore::Local(s) => s.remove_item(key).map_err(|e| StoreError::Write {
                key: key.to_string(),
                message: js_message(&e),
            }),
            BrowserStore::Memory(m) => m.remove(key),
        }
    }
}
