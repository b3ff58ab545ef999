//! The signed-in user's notes: live list, search, category filter, delete.

use dioxus::prelude::*;
use store::{CategoryFilter, Note, NoteFilter, NoteList, PendingDelete};
use ui::components::{Button, ButtonVariant, ErrorBanner};
use ui::views::{ConfirmDialog, FilterBar, NoteCard};
use ui::{use_backend, use_session};

use crate::Route;

#[component]
pub fn Dashboard() -> Element {
    let backend = use_backend();
    let session = use_session();
    let nav = use_navigator();
    let mut notes = use_signal(NoteList::default);
    let mut search = use_signal(String::new);
    let mut category = use_signal(CategoryFilter::default);
    let mut pending = use_signal(|| Option::<PendingDelete>::None);
    let mut error = use_signal(|| Option::<String>::None);
    let uid = use_memo(move || session().uid().map(str::to_string));

    // One live feed per signed-in user. A new uid drops the old future, and with
    // it the old subscription, before the next feed opens.
    let feed_backend = backend.clone();
    let _feed = use_resource(move || {
        let backend = feed_backend.clone();
        async move {
            let Some(uid) = uid() else {
                notes.set(NoteList::default());
                return;
            };
            let mut feed = backend.feed();
            if let Err(e) = feed.activate(&uid).await {
                tracing::error!(%uid, error = %e, "could not open note feed");
                error.set(Some("Could not load your notes. Try again.".to_string()));
                return;
            }
            while let Some(snapshot) = feed.next_snapshot().await {
                // Polling repeats unchanged snapshots; only a real change clears the banner
                if *notes.peek() != snapshot {
                    notes.set(snapshot);
                    error.set(None);
                }
            }
            tracing::debug!(%uid, "note feed ended");
        }
    });

    let filter = NoteFilter::new(search(), category());
    let shown: Vec<Note> = filter.apply(notes.read().notes()).into_iter().cloned().collect();
    let greeting = session()
        .profile()
        .map(|p| format!("Welcome, {}", p.display_name()))
        .unwrap_or_else(|| "My Notes".to_string());

    let request_delete = move |id: String| {
        pending.set(notes.read().request_delete(&id));
    };

    let delete_backend = backend.clone();
    let confirm_delete = move |_| {
        let Some(delete) = pending.write().take() else {
            return;
        };
        let repo = delete_backend.repo();
        spawn(async move {
            let id = delete.id().to_string();
            match delete.confirm(&repo).await {
                Ok(()) => {
                    tracing::info!(%id, "note deleted");
                    error.set(None);
                }
                Err(e) => {
                    tracing::error!(%id, error = %e, "delete failed");
                    error.set(Some("Could not delete the note. Try again.".to_string()));
                }
            }
        });
    };

    let handle_logout = move |_| {
        let session = backend.session.clone();
        spawn(async move {
            session.logout().await;
            nav.replace(Route::Login {});
        });
    };

    rsx! {
        div {
            class: "dashboard",

            header {
                class: "dashboard-header",
                h1 { class: "page-title", "{greeting}" }
                div {
                    class: "dashboard-actions",
                    Button {
                        onclick: move |_| { nav.push(Route::CreateNote {}); },
                        "+ New Note"
                    }
                    Button {
                        variant: ButtonVariant::Outline,
                        onclick: handle_logout,
                        "Logout"
                    }
                }
            }

            if let Some(err) = error() {
                ErrorBanner { message: err }
            }

            FilterBar {
                search: search(),
                category: category(),
                on_search: move |text: String| search.set(text),
                on_category: move |choice: CategoryFilter| category.set(choice),
            }

            if shown.is_empty() {
                p { class: "empty-state", "No notes found" }
            } else {
                div {
                    class: "note-grid",
                    for note in shown {
                        NoteCard {
                            key: "{note.id}",
                            note: note.clone(),
                            on_edit: move |id: String| { nav.push(Route::EditNote { id }); },
                            on_delete: request_delete,
                        }
                    }
                }
            }

            if let Some(delete) = pending() {
                ConfirmDialog {
                    prompt: PendingDelete::PROMPT.to_string(),
                    detail: delete.title().to_string(),
                    on_confirm: confirm_delete,
                    on_cancel: move |_| pending.set(None),
                }
            }
        }
    }
}
