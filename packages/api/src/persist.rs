//! Saved sign-in that survives a page reload.
//!
//! The web build keeps the refresh token in `localStorage`, native builds in a
//! file under the platform data directory. A fresh ID token is minted from it on
//! start-up.

use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
const STORAGE_KEY: &str = "notekeep.session";

/// What is needed to sign the same user back in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub uid: String,
    pub email: String,
    pub refresh_token: String,
}

impl SavedSession {
    fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    fn from_json(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(saved) => Some(saved),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable saved session");
                None
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(target_arch = "wasm32")]
pub fn load() -> Option<SavedSession> {
    let raw = local_storage()?.get_item(STORAGE_KEY).ok()??;
    SavedSession::from_json(&raw)
}

#[cfg(target_arch = "wasm32")]
pub fn save(session: &SavedSession) {
    let (Some(storage), Some(raw)) = (local_storage(), session.to_json()) else {
        return;
    };
    if storage.set_item(STORAGE_KEY, &raw).is_err() {
        tracing::warn!("could not save session to localStorage");
    }
}

#[cfg(target_arch = "wasm32")]
pub fn clear() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(STORAGE_KEY);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn session_file() -> std::path::PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("notekeep")
        .join("session.json")
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load() -> Option<SavedSession> {
    let raw = std::fs::read_to_string(session_file()).ok()?;
    SavedSession::from_json(&raw)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save(session: &SavedSession) {
    let path = session_file();
    let Some(raw) = session.to_json() else {
        return;
    };
    let written = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| std::fs::write(&path, raw));
    if let Err(e) = written {
        tracing::warn!(path = %path.display(), error = %e, "could not save session");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn clear() {
    let _ = std::fs::remove_file(session_file());
}
