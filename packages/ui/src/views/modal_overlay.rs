use dioxus::prelude::*;

use crate::components::{Button, ButtonVariant};

/// A full-screen overlay that centers its children in a modal card.
/// Clicking outside the card triggers `on_close`.
#[component]
pub fn ModalOverlay(on_close: EventHandler<()>, children: Element) -> Element {
    rsx! {
        div {
            class: "modal-backdrop",
            onclick: move |_| on_close.call(()),
            div {
                class: "modal-card",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                {children}
            }
        }
    }
}

/// Yes/no confirmation. Dismissing the overlay counts as "no".
#[component]
pub fn ConfirmDialog(
    prompt: String,
    #[props(default)] detail: String,
    #[props(default = "Delete".to_string())] confirm_label: String,
    on_confirm: EventHandler<()>,
    on_cancel: EventHandler<()>,
) -> Element {
    rsx! {
        ModalOverlay {
            on_close: move |_| on_cancel.call(()),
            div {
                class: "confirm-dialog",
                h2 { class: "confirm-prompt", "{prompt}" }
                if !detail.is_empty() {
                    p { class: "confirm-detail", "{detail}" }
                }
                div {
                    class: "confirm-actions",
                    Button {
                        variant: ButtonVariant::Destructive,
                        onclick: move |_| on_confirm.call(()),
                        "{confirm_label}"
                    }
                    Button {
                        variant: ButtonVariant::Outline,
                        onclick: move |_| on_cancel.call(()),
                        "Cancel"
                    }
                }
            }
        }
    }
}
