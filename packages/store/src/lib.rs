//! # Store crate: domain logic of Notekeep
//!
//! Everything here is UI-free and runs the same on native and WASM targets. The
//! hosted services sit behind three async traits defined in this crate:
//!
//! | Trait | In-memory implementation | Hosted implementation |
//! |-------|--------------------------|-----------------------|
//! | [`AuthProvider`] | [`MemoryAuth`] | `api::FirebaseAuth` |
//! | [`DocumentStore`] | [`MemoryStore`] | `api::Firestore` |
//! | [`MediaHost`] | [`MemoryMediaHost`] | `api::Cloudinary` |
//!
//! On top of those, [`SessionStore`] tracks the signed-in user, [`NoteFeed`] follows a
//! user's notes live, [`NoteEditor`] implements create/edit, [`NoteFilter`] does the
//! list's search, and [`access`] decides which routes need a session.

pub mod access;
pub mod auth;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod feed;
pub mod filter;
pub mod media;
pub mod models;
pub mod repo;
pub mod session;

mod memory;
pub use memory::MemoryStore;

pub use auth::{AuthProvider, MemoryAuth};
pub use config::NotekeepConfig;
pub use document::{CollectionPath, DocPath, Document, Query, StoredDocument, Subscription, Write};
pub use editor::{EditorForm, EditorMode, NoteEditor};
pub use error::{
    AuthCreationError, AuthCredentialError, EditorError, MissingField, SaveError, StoreError,
    UploadError,
};
pub use feed::{NoteFeed, NoteList, PendingDelete};
pub use filter::NoteFilter;
pub use media::{ImageFile, MediaHost, MemoryMediaHost};
pub use models::{
    check_credentials, Category, CategoryFilter, Note, NoteDraft, SignupForm, UserIdentity,
    UserProfile,
};
pub use repo::{DocumentStore, Repository};
pub use session::{SessionState, SessionStore};
