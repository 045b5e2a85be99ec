use web_sys::Storage;

use crate::session::SessionStore;

/// The browser's localStorage behind the session storage seam. A missing
/// window (or blocked storage) degrades to an always-empty store, which the
/// session lifecycle treats as "no persisted record".
pub struct LocalStorageStore;

fn local_storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

impl SessionStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = local_storage() {
            if storage.set_item(key, value).is_err() {
                log::warn!("Failed to persist session key: {key}");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}
