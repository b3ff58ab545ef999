use dioxus::prelude::*;
use store::Note;

use crate::components::{Button, ButtonVariant};

/// One note in the dashboard grid.
#[component]
pub fn NoteCard(note: Note, on_edit: EventHandler<String>, on_delete: EventHandler<String>) -> Element {
    let edit_id = note.id.clone();
    let delete_id = note.id.clone();
    let created = note
        .created_at
        .map(|at| at.format("%b %-d, %Y").to_string())
        .unwrap_or_default();
    let badge = format!("category-badge category-{}", note.category.as_str().to_lowercase());

    rsx! {
        article {
            class: "note-card",
            if let Some(url) = note.image_url.as_deref() {
                img { class: "note-card-image", src: "{url}", alt: "{note.title}" }
            }
            div {
                class: "note-card-body",
                div {
                    class: "note-card-header",
                    h3 { class: "note-card-title", "{note.title}" }
                    span { class: "{badge}", "{note.category}" }
                }
                p { class: "note-card-content", "{note.content}" }
                if !created.is_empty() {
                    time { class: "note-card-date", "{created}" }
                }
            }
            div {
                class: "note-card-actions",
                Button {
                    variant: ButtonVariant::Outline,
                    onclick: move |_| on_edit.call(edit_id.clone()),
                    "Edit"
                }
                Button {
                    variant: ButtonVariant::Destructive,
                    onclick: move |_| on_delete.call(delete_id.clone()),
                    "Delete"
                }
            }
        }
    }
}
