use gloo_storage::{LocalStorage, Storage};

// Read-only login: only the viewer's public key is kept
const STORAGE_KEY_VIEWER: &str = "nostrprofile_viewer_pubkey";

/// The viewer key saved by the last login, if any
pub fn load_viewer() -> Option<String> {
    LocalStorage::get::<String>(STORAGE_KEY_VIEWER).ok()
}

pub fn save_viewer(pubkey: &str) {
    if let Err(e) = LocalStorage::set(STORAGE_KEY_VIEWER, pubkey) {
        log::warn!("Failed to save viewer: {}", e);
    }
}

pub fn clear_viewer() {
    LocalStorage::delete(STORAGE_KEY_VIEWER);
}
