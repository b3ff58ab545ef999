//! Live note list of one user.
//!
//! A [`NoteFeed`] owns at most one subscription. Activating it for another user
//! cancels the previous subscription before the new one is opened, so snapshots
//! of two identities can never interleave. Local state is replaced wholesale by
//! each snapshot; deletes are never applied optimistically.

use crate::document::Subscription;
use crate::error::StoreError;
use crate::models::Note;
use crate::repo::{decode_notes, DocumentStore, Repository};

pub struct NoteFeed<S: DocumentStore> {
    repo: Repository<S>,
    active: Option<(String, Subscription)>,
}

impl<S: DocumentStore> NoteFeed<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo, active: None }
    }

    /// Start following `uid`'s notes. A no-op if already following them.
    pub async fn activate(&mut self, uid: &str) -> Result<(), StoreError> {
        if self.uid() == Some(uid) {
            return Ok(());
        }
        self.deactivate();
        let sub = self.repo.watch_notes(uid).await?;
        tracing::debug!(%uid, "note feed active");
        self.active = Some((uid.to_string(), sub));
        Ok(())
    }

    pub fn deactivate(&mut self) {
        if let Some((uid, sub)) = self.active.take() {
            sub.cancel();
            tracing::debug!(%uid, "note feed cancelled");
        }
    }

    /// Wait for the next snapshot. It replaces whatever list the caller holds.
    ///
    /// Returns `None` when inactive or when the store ends the subscription.
    pub async fn next_snapshot(&mut self) -> Option<NoteList> {
        let (uid, sub) = self.active.as_mut()?;
        let docs = sub.next().await?;
        Some(NoteList {
            uid: uid.clone(),
            notes: decode_notes(docs),
        })
    }

    pub fn uid(&self) -> Option<&str> {
        self.active.as_ref().map(|(uid, _)| uid.as_str())
    }
}

/// One snapshot of a user's notes, newest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteList {
    uid: String,
    notes: Vec<Note>,
}

impl NoteList {
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Prepare the deletion of one of the listed notes.
    pub fn request_delete(&self, id: &str) -> Option<PendingDelete> {
        let note = self.notes.iter().find(|n| n.id == id)?;
        Some(PendingDelete::new(&self.uid, note))
    }
}

/// A delete that waits for the user to confirm it.
///
/// Dropping it is the same as declining.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingDelete {
    uid: String,
    id: String,
    title: String,
}

impl PendingDelete {
    pub const PROMPT: &'static str = "Delete this note?";

    pub fn new(uid: &str, note: &Note) -> Self {
        Self {
            uid: uid.to_string(),
            id: note.id.clone(),
            title: note.title.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The user said yes: delete the note's document.
    pub async fn confirm<S: DocumentStore>(self, repo: &Repository<S>) -> Result<(), StoreError> {
        repo.delete_note(&self.uid, &self.id).await
    }
}
