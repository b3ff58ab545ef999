//! Media host port: images go up, a public URL comes back.

use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::error::UploadError;

/// An image picked by the user, read fully into memory.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Build an image from a file picker. The type the browser reported wins over
    /// a guess from the extension.
    pub fn picked(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&name)
                    .first_or_octet_stream()
                    .to_string()
            });
        Self {
            name,
            content_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Async trait for the hosted image store.
pub trait MediaHost {
    /// Upload `image` and return its public https URL.
    fn upload(&self, image: &ImageFile) -> impl Future<Output = Result<String, UploadError>>;
}

/// In-memory MediaHost for testing and native builds.
#[derive(Clone, Debug, Default)]
pub struct MemoryMediaHost {
    uploads: Arc<Mutex<Vec<ImageFile>>>,
}

impl MemoryMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().map(|u| u.len()).unwrap_or(0)
    }
}

impl MediaHost for MemoryMediaHost {
    async fn upload(&self, image: &ImageFile) -> Result<String, UploadError> {
        if image.is_empty() {
            return Err(UploadError::Rejected("empty file".to_string()));
        }
        let mut uploads = self
            .uploads
            .lock()
            .map_err(|_| UploadError::Transport("upload table poisoned".to_string()))?;
        uploads.push(image.clone());
        Ok(format!("memory://media/{}/{}", uploads.len(), image.name))
    }
}
