//! # Repository: typed profile and note operations on an abstract document store
//!
//! [`Repository`] is the only place that knows where profiles and notes live and
//! how they are encoded. All reads and writes go through the [`DocumentStore`]
//! trait, so the same logic works against the in-memory store (tests and native
//! builds) and the hosted document database (web builds).
//!
//! ## [`DocumentStore`] trait
//!
//! The six operations the application consumes from the hosted database:
//! `get`, `set`, `add`, `update`, `delete` on single documents, and `subscribe`
//! for a live, ordered query over one collection. `add` lets storage assign the
//! id. `set` replaces a document, `update` merges fields into an existing one.
//! Any [`Write`] may ask storage to stamp a field with its own clock.
//!
//! ## Operations
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | [`get_profile`](Repository::get_profile) / [`put_profile`](Repository::put_profile) | `users/{uid}` | |
//! | [`get_note`](Repository::get_note) | `users/{uid}/notes/{id}` | |
//! | [`create_note`](Repository::create_note) | `users/{uid}/notes` | stamps `createdAt` |
//! | [`update_note`](Repository::update_note) | `users/{uid}/notes/{id}` | stamps `updatedAt`, leaves `createdAt` alone |
//! | [`delete_note`](Repository::delete_note) | `users/{uid}/notes/{id}` | |
//! | [`watch_notes`](Repository::watch_notes) | `users/{uid}/notes` | newest first by `createdAt` |

use std::future::Future;

use crate::document::{CollectionPath, DocPath, Document, Query, StoredDocument, Subscription, Write};
use crate::error::{SaveError, StoreError};
use crate::models::{Note, NoteDraft, UserProfile};

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Async trait for reading, writing and watching documents.
pub trait DocumentStore {
    fn get(
        &self,
        path: &DocPath,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>>;
    fn set(
        &self,
        path: &DocPath,
        write: Write,
    ) -> impl Future<Output = Result<(), StoreError>>;
    /// Create a document with a storage-assigned id and return that id.
    fn add(
        &self,
        collection: &CollectionPath,
        write: Write,
    ) -> impl Future<Output = Result<String, StoreError>>;
    /// Merge fields into an existing document. Fails with `NotFound` if it is absent.
    fn update(
        &self,
        path: &DocPath,
        write: Write,
    ) -> impl Future<Output = Result<(), StoreError>>;
    fn delete(
        &self,
        path: &DocPath,
    ) -> impl Future<Output = Result<(), StoreError>>;
    /// Open a live query. The current result is delivered before this resolves.
    fn subscribe(
        &self,
        query: Query,
    ) -> impl Future<Output = Result<Subscription, StoreError>>;
}

/// Profiles and notes backed by a DocumentStore.
#[derive(Clone, Debug)]
pub struct Repository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        let Some(doc) = self.store.get(&DocPath::profile_of(uid)).await? else {
            return Ok(None);
        };
        crate::document::from_document(doc).map(Some)
    }

    pub async fn put_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let write = Write::from_serialize(profile)?;
        self.store.set(&DocPath::profile_of(&profile.uid), write).await
    }

    pub async fn get_note(&self, uid: &str, id: &str) -> Result<Option<Note>, StoreError> {
        let path = DocPath::note_of(uid, id);
        let Some(fields) = self.store.get(&path).await? else {
            return Ok(None);
        };
        decode_note(StoredDocument {
            id: id.to_string(),
            fields,
        })
        .map(Some)
    }

    /// Store a new note and return its id.
    pub async fn create_note(&self, uid: &str, draft: &NoteDraft) -> Result<String, SaveError> {
        let write = Write::from_serialize(draft)?.stamped(CREATED_AT);
        let id = self.store.add(&CollectionPath::notes_of(uid), write).await?;
        tracing::info!(%uid, %id, "note created");
        Ok(id)
    }

    pub async fn update_note(&self, uid: &str, id: &str, draft: &NoteDraft) -> Result<(), SaveError> {
        let write = Write::from_serialize(draft)?.stamped(UPDATED_AT);
        match self.store.update(&DocPath::note_of(uid, id), write).await {
            Ok(()) => {
                tracing::info!(%uid, %id, "note updated");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(SaveError::Missing(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_note(&self, uid: &str, id: &str) -> Result<(), StoreError> {
        self.store.delete(&DocPath::note_of(uid, id)).await?;
        tracing::info!(%uid, %id, "note deleted");
        Ok(())
    }

    /// Live query over the user's notes, newest first.
    pub async fn watch_notes(&self, uid: &str) -> Result<Subscription, StoreError> {
        let query = Query::new(CollectionPath::notes_of(uid), CREATED_AT).descending();
        self.store.subscribe(query).await
    }
}

fn decode_note(doc: StoredDocument) -> Result<Note, StoreError> {
    let mut note: Note = doc.decode()?;
    note.id = doc.id;
    Ok(note)
}

/// Decode a snapshot, skipping documents that do not look like notes.
pub fn decode_notes(docs: Vec<StoredDocument>) -> Vec<Note> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match decode_note(doc) {
                Ok(note) => Some(note),
                Err(e) => {
                    tracing::warn!(%id, error = %e, "skipping malformed note");
                    None
                }
            }
        })
        .collect()
}
