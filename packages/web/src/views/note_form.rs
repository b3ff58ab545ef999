//! Create and edit pages, sharing one form.

use dioxus::prelude::*;
use store::{Category, EditorForm, EditorMode, ImageFile};
use ui::components::{Button, ButtonVariant, ErrorBanner, Input, Label};
use ui::views::ImagePicker;
use ui::{use_backend, use_session};

use crate::Route;

#[component]
pub fn CreateNote() -> Element {
    rsx! {
        NoteForm { mode: EditorMode::Create }
    }
}

#[component]
pub fn EditNote(id: String) -> Element {
    rsx! {
        NoteForm { key: "{id}", mode: EditorMode::Edit(id.clone()) }
    }
}

#[component]
fn NoteForm(mode: EditorMode) -> Element {
    let backend = use_backend();
    let session = use_session();
    let nav = use_navigator();
    let mut form = use_signal(EditorForm::default);
    let mut error = use_signal(|| Option::<String>::None);
    let mut saving = use_signal(|| false);
    let needs_load = mode.needs_load();
    let mut loaded = use_signal(move || !needs_load);

    // Pre-populate from the stored note when editing
    let load_backend = backend.clone();
    let load_mode = mode.clone();
    let _loader = use_resource(move || {
        let editor = load_backend.editor();
        let mode = load_mode.clone();
        async move {
            let Some(uid) = session.peek().uid().map(str::to_string) else {
                return;
            };
            match editor.load(&uid, &mode).await {
                Ok(stored) => {
                    form.set(stored);
                    loaded.set(true);
                }
                Err(e) => {
                    tracing::error!(%uid, error = %e, "could not load note");
                    error.set(Some("Could not load the note. Try again.".to_string()));
                }
            }
        }
    });

    let save_mode = mode.clone();
    let handle_save = move |evt: FormEvent| {
        evt.prevent_default();
        if saving() || !loaded() {
            return;
        }
        let editor = backend.editor();
        let mode = save_mode.clone();
        let uid = session.peek().uid().map(str::to_string);
        let current = form();
        spawn(async move {
            error.set(None);
            saving.set(true);
            match editor.save(uid.as_deref(), &mode, &current).await {
                Ok(id) => {
                    tracing::info!(%id, edit = mode.is_edit(), "note saved");
                    nav.replace(Route::Dashboard {});
                }
                Err(e) => {
                    tracing::error!(error = %e, "saving note failed");
                    error.set(Some(e.user_message().to_string()));
                    saving.set(false);
                }
            }
        });
    };

    let heading = mode.heading();
    let current = form();
    let category_value = current.category.map(|c| c.as_str()).unwrap_or_default();
    let preview = current.preview_url().map(str::to_string);
    let picked = current.new_image.as_ref().map(|img| img.name.clone());
    // Read-only while the stored note is loading or a save is in flight
    let locked = !loaded() || saving();

    rsx! {
        div {
            class: "editor-page",
            h1 { class: "page-title", "{heading}" }

            form {
                onsubmit: handle_save,
                class: "editor-form",

                if let Some(err) = error() {
                    ErrorBanner { message: err }
                }

                Label { html_for: "note-title", "Title" }
                Input {
                    id: "note-title",
                    placeholder: "Title",
                    disabled: locked,
                    value: current.title.clone(),
                    oninput: move |evt: FormEvent| form.write().title = evt.value(),
                }

                Label { html_for: "note-content", "Content" }
                textarea {
                    id: "note-content",
                    class: "input textarea",
                    rows: "8",
                    placeholder: "Write your note...",
                    disabled: locked,
                    value: "{current.content}",
                    oninput: move |evt: FormEvent| form.write().content = evt.value(),
                }

                Label { html_for: "note-category", "Category" }
                select {
                    id: "note-category",
                    class: "select",
                    disabled: locked,
                    value: "{category_value}",
                    onchange: move |evt: FormEvent| {
                        form.write().category = evt.value().parse::<Category>().ok();
                    },
                    option { value: "", selected: category_value.is_empty(), "Select category" }
                    for c in Category::ALL {
                        option {
                            key: "{c}",
                            value: "{c}",
                            selected: c.as_str() == category_value,
                            "{c}"
                        }
                    }
                }

                Label { html_for: "note-image", "Image (optional)" }
                ImagePicker {
                    disabled: locked,
                    on_pick: move |image: ImageFile| form.write().new_image = Some(image),
                }
                if let Some(name) = picked {
                    p { class: "image-picked", "Selected: {name}" }
                }
                if let Some(url) = preview {
                    img { class: "image-preview", src: "{url}", alt: "Current image" }
                }

                div {
                    class: "editor-actions",
                    Button {
                        submit: true,
                        disabled: locked,
                        if saving() { "Saving..." } else { "Save Note" }
                    }
                    Button {
                        variant: ButtonVariant::Outline,
                        onclick: move |_| { nav.push(Route::Dashboard {}); },
                        "Cancel"
                    }
                }
            }
        }
    }
}
