//! # Note editor: load, validate, upload, save
//!
//! [`NoteEditor`] holds the non-visual half of the create/edit page.
//!
//! - [`EditorMode::Create`] starts from an empty [`EditorForm`]; [`EditorMode::Edit`]
//!   loads the stored note and pre-populates every field, including the URL of any
//!   previously attached image.
//! - [`save`](NoteEditor::save) refuses incomplete forms before touching the network.
//!   A newly chosen image is uploaded first and its URL replaces the old one; with no
//!   new image the old URL is kept. A failed upload aborts the save.
//! - Create lets storage stamp `createdAt`; update stamps `updatedAt` and leaves
//!   `createdAt` as it was.

use crate::error::{EditorError, StoreError};
use crate::media::{ImageFile, MediaHost};
use crate::models::{Category, Note, NoteDraft};
use crate::repo::{DocumentStore, Repository};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(String),
}

impl EditorMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Edit(_))
    }

    /// The form stays read-only until [`NoteEditor::load`] has filled it.
    pub fn needs_load(&self) -> bool {
        self.is_edit()
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Self::Create => "Create Note",
            Self::Edit(_) => "Edit Note",
        }
    }
}

/// Current contents of the editor form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorForm {
    pub title: String,
    pub content: String,
    pub category: Option<Category>,
    /// URL saved with the note before this edit.
    pub existing_image_url: Option<String>,
    /// Image picked in this session, not yet uploaded.
    pub new_image: Option<ImageFile>,
}

impl EditorForm {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            category: Some(note.category),
            existing_image_url: note.image_url.clone(),
            new_image: None,
        }
    }

    /// Title, content and category are all present. Whitespace does not count.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty() && self.category.is_some()
    }

    /// The stored image to preview, shown only while no new image is picked.
    pub fn preview_url(&self) -> Option<&str> {
        match self.new_image {
            Some(_) => None,
            None => self.existing_image_url.as_deref(),
        }
    }
}

pub struct NoteEditor<S: DocumentStore, M: MediaHost> {
    repo: Repository<S>,
    media: M,
}

impl<S: DocumentStore, M: MediaHost> NoteEditor<S, M> {
    pub fn new(repo: Repository<S>, media: M) -> Self {
        Self { repo, media }
    }

    /// Initial form contents for `mode`.
    ///
    /// Editing a note that no longer exists yields an empty form.
    pub async fn load(&self, uid: &str, mode: &EditorMode) -> Result<EditorForm, StoreError> {
        let EditorMode::Edit(id) = mode else {
            return Ok(EditorForm::default());
        };
        match self.repo.get_note(uid, id).await? {
            Some(note) => Ok(EditorForm::from_note(&note)),
            None => {
                tracing::warn!(%uid, %id, "note to edit was not found");
                Ok(EditorForm::default())
            }
        }
    }

    /// Save the form and return the note's id.
    pub async fn save(
        &self,
        uid: Option<&str>,
        mode: &EditorMode,
        form: &EditorForm,
    ) -> Result<String, EditorError> {
        let uid = uid.ok_or(EditorError::NotSignedIn)?;
        let Some(category) = form.category.filter(|_| form.is_complete()) else {
            return Err(EditorError::MissingFields);
        };

        let uploaded = match &form.new_image {
            Some(image) => {
                let url = self.media.upload(image).await?;
                tracing::info!(%uid, name = %image.name, "image uploaded");
                Some(url)
            }
            None => None,
        };

        let draft = NoteDraft {
            title: form.title.clone(),
            content: form.content.clone(),
            category,
            image_url: uploaded.or_else(|| form.existing_image_url.clone()),
        };

        match mode {
            EditorMode::Create => Ok(self.repo.create_note(uid, &draft).await?),
            EditorMode::Edit(id) => {
                self.repo.update_note(uid, id, &draft).await?;
                Ok(id.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CollectionPath;
    use crate::error::{SaveError, UploadError};
    use crate::media::MemoryMediaHost;
    use crate::memory::MemoryStore;

    struct BrokenHost;

    impl MediaHost for BrokenHost {
        async fn upload(&self, _image: &ImageFile) -> Result<String, UploadError> {
            Err(UploadError::Transport("connection reset".to_string()))
        }
    }

    fn filled() -> EditorForm {
        EditorForm {
            title: "Trip".to_string(),
            content: "Pack bags".to_string(),
            category: Some(Category::Personal),
            ..EditorForm::default()
        }
    }

    fn editor() -> (NoteEditor<MemoryStore, MemoryMediaHost>, Repository<MemoryStore>, MemoryMediaHost) {
        let repo = Repository::new(MemoryStore::new());
        let media = MemoryMediaHost::new();
        (NoteEditor::new(repo.clone(), media.clone()), repo, media)
    }

    #[tokio::test]
    async fn test_create_then_fetch_matches() {
        let (editor, repo, _) = editor();
        let id = editor.save(Some("u1"), &EditorMode::Create, &filled()).await.unwrap();

        let note = repo.get_note("u1", &id).await.unwrap().unwrap();
        assert_eq!(note.title, "Trip");
        assert_eq!(note.content, "Pack bags");
        assert_eq!(note.category, Category::Personal);
        assert_eq!(note.image_url, None);
        assert!(note.created_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_fields_block_save() {
        let (editor, repo, media) = editor();
        let mut form = filled();
        form.new_image = Some(ImageFile::picked("a.png", None, vec![1]));
        for broken in [
            EditorForm { title: String::new(), ..form.clone() },
            EditorForm { content: "   ".to_string(), ..form.clone() },
            EditorForm { category: None, ..form.clone() },
        ] {
            let err = editor.save(Some("u1"), &EditorMode::Create, &broken).await.unwrap_err();
            assert_eq!(err, EditorError::MissingFields);
        }
        assert_eq!(media.upload_count(), 0);
        assert_eq!(repo.store().collection_len(&CollectionPath::notes_of("u1")), 0);
    }

    #[tokio::test]
    async fn test_requires_user() {
        let (editor, _, _) = editor();
        let err = editor.save(None, &EditorMode::Create, &filled()).await.unwrap_err();
        assert_eq!(err, EditorError::NotSignedIn);
    }

    #[tokio::test]
    async fn test_edit_round_trip_prepopulates_everything() {
        let (editor, _, _) = editor();
        let mut form = filled();
        form.new_image = Some(ImageFile::picked("beach.jpg", None, vec![9, 9]));
        let id = editor.save(Some("u1"), &EditorMode::Create, &form).await.unwrap();

        let mode = EditorMode::Edit(id);
        let loaded = editor.load("u1", &mode).await.unwrap();
        assert_eq!(loaded.title, "Trip");
        assert_eq!(loaded.content, "Pack bags");
        assert_eq!(loaded.category, Some(Category::Personal));
        assert_eq!(loaded.existing_image_url.as_deref(), Some("memory://media/1/beach.jpg"));
        assert_eq!(loaded.preview_url(), Some("memory://media/1/beach.jpg"));
        assert!(loaded.new_image.is_none());
    }

    #[tokio::test]
    async fn test_edit_keeps_previous_image_and_created_at() {
        let (editor, repo, media) = editor();
        let mut form = filled();
        form.new_image = Some(ImageFile::picked("beach.jpg", None, vec![9]));
        let id = editor.save(Some("u1"), &EditorMode::Create, &form).await.unwrap();
        let created = repo.get_note("u1", &id).await.unwrap().unwrap();

        let mode = EditorMode::Edit(id.clone());
        let mut loaded = editor.load("u1", &mode).await.unwrap();
        loaded.title = "Trip (updated)".to_string();
        assert_eq!(editor.save(Some("u1"), &mode, &loaded).await.unwrap(), id);

        let updated = repo.get_note("u1", &id).await.unwrap().unwrap();
        assert_eq!(updated.title, "Trip (updated)");
        assert_eq!(updated.image_url, created.image_url);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(media.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_new_image_replaces_old() {
        let (editor, repo, _) = editor();
        let mut form = filled();
        form.new_image = Some(ImageFile::picked("one.png", None, vec![1]));
        let id = editor.save(Some("u1"), &EditorMode::Create, &form).await.unwrap();

        let mode = EditorMode::Edit(id.clone());
        let mut loaded = editor.load("u1", &mode).await.unwrap();
        loaded.new_image = Some(ImageFile::picked("two.png", None, vec![2]));
        assert_eq!(loaded.preview_url(), None);
        editor.save(Some("u1"), &mode, &loaded).await.unwrap();

        let note = repo.get_note("u1", &id).await.unwrap().unwrap();
        assert_eq!(note.image_url.as_deref(), Some("memory://media/2/two.png"));
    }

    #[tokio::test]
    async fn test_failed_upload_aborts_save() {
        let repo = Repository::new(MemoryStore::new());
        let editor = NoteEditor::new(repo.clone(), BrokenHost);
        let mut form = filled();
        form.new_image = Some(ImageFile::picked("a.png", None, vec![1]));

        let err = editor.save(Some("u1"), &EditorMode::Create, &form).await.unwrap_err();
        assert!(matches!(err, EditorError::Upload(UploadError::Transport(_))));

        let mut sub = repo.watch_notes("u1").await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_editing_deleted_note() {
        let (editor, repo, _) = editor();
        let id = editor.save(Some("u1"), &EditorMode::Create, &filled()).await.unwrap();
        let mode = EditorMode::Edit(id.clone());
        let form = editor.load("u1", &mode).await.unwrap();

        repo.delete_note("u1", &id).await.unwrap();
        assert_eq!(editor.load("u1", &mode).await.unwrap(), EditorForm::default());

        let err = editor.save(Some("u1"), &mode, &form).await.unwrap_err();
        assert_eq!(err, EditorError::Save(SaveError::Missing(id)));
    }

    #[test]
    fn test_only_edit_mode_waits_for_a_load() {
        assert!(!EditorMode::Create.needs_load());
        assert!(EditorMode::Edit("x".into()).needs_load());
        assert_eq!(EditorMode::Create.heading(), "Create Note");
    }
}
