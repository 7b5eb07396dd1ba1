//! `window.localStorage` as a credential store

use wasm_bindgen::JsValue;
use web_sys::Storage;
use xm_core::{KeyValueStore, StorageError};

/// [`KeyValueStore`] backed by the page's `localStorage`
///
/// The storage object is looked up on every call, so the handle itself holds
/// no JS state and can be shared with the client's interceptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<Storage, StorageError> {
        let window =
            web_sys::window().ok_or_else(|| StorageError::unavailable("no window object"))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StorageError::unavailable("localStorage is disabled"))
    }
}

fn js_error(err: JsValue) -> StorageError {
    StorageError::unavailable(format!("{err:?}"))
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?.get_item(key).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?.set_item(key, value).map_err(js_error)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?.remove_item(key).map_err(js_error)
    }
}
