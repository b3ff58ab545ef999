//! Backend selection for all platforms.
//!
//! - **`hosted` feature**: identity, documents and images go to the hosted
//!   services configured in `notekeep.toml` (see the `api` crate).
//! - **otherwise**: everything lives in memory for the lifetime of the app, which
//!   is what desktop builds and local development use.
//!
//! The hosted database cannot push changes, so [`Backend::keep_fresh`] re-runs its
//! open live queries every `poll_interval_secs`. The in-memory store pushes on
//! every write and needs no polling.

use std::time::Duration;

use dioxus::prelude::*;
use store::{NoteEditor, NoteFeed, NotekeepConfig, Repository, SessionStore};

#[cfg(feature = "hosted")]
mod selected {
    pub type Auth = api::FirebaseAuth;
    pub type Db = api::Firestore;
    pub type Media = api::Cloudinary;

    pub fn connect(config: &store::NotekeepConfig) -> (Auth, Db, Media) {
        let hosted = api::Hosted::connect(config);
        tracing::info!(project = %config.firebase.project_id, "using hosted backend");
        (hosted.auth, hosted.store, hosted.media)
    }

    pub async fn poll(db: Db, every: std::time::Duration) {
        loop {
            #[cfg(target_arch = "wasm32")]
            gloo_timers::future::sleep(every).await;
            #[cfg(not(target_arch = "wasm32"))]
            tokio::time::sleep(every).await;

            db.refresh_open().await;
        }
    }
}

#[cfg(not(feature = "hosted"))]
mod selected {
    pub type Auth = store::MemoryAuth;
    pub type Db = store::MemoryStore;
    pub type Media = store::MemoryMediaHost;

    pub fn connect(_config: &store::NotekeepConfig) -> (Auth, Db, Media) {
        tracing::info!("using in-memory backend");
        (Auth::new(), Db::new(), Media::new())
    }

    pub async fn poll(_db: Db, _every: std::time::Duration) {}
}

pub use selected::{Auth, Db, Media};

/// The session plus the media host, shared through context.
#[derive(Clone)]
pub struct Backend {
    pub session: SessionStore<Auth, Db>,
    pub media: Media,
    poll_every: Option<Duration>,
}

impl Backend {
    pub fn connect(config: &NotekeepConfig) -> Self {
        let (auth, db, media) = selected::connect(config);
        Self {
            session: SessionStore::new(auth, Repository::new(db)),
            media,
            poll_every: config.firebase.poll_interval(),
        }
    }

    /// Re-run open live queries on a timer until the app exits.
    pub async fn keep_fresh(self) {
        let Some(every) = self.poll_every else {
            tracing::debug!("live query polling disabled");
            return;
        };
        selected::poll(self.repo().store().clone(), every).await;
    }

    pub fn repo(&self) -> Repository<Db> {
        self.session.repo().clone()
    }

    pub fn feed(&self) -> NoteFeed<Db> {
        NoteFeed::new(self.repo())
    }

    pub fn editor(&self) -> NoteEditor<Db, Media> {
        NoteEditor::new(self.repo(), self.media.clone())
    }
}

/// The backend provided by [`SessionProvider`](crate::SessionProvider).
pub fn use_backend() -> Backend {
    use_context::<Backend>()
}
