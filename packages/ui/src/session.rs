//! Session context and hooks for the UI.

use dioxus::prelude::*;
use store::{NotekeepConfig, SessionState};

use crate::backend::Backend;

/// Get the current session state.
/// Returns a signal that updates when the user signs up, logs in or logs out.
pub fn use_session() -> Signal<SessionState> {
    use_context::<Signal<SessionState>>()
}

/// Provider component that owns the backend and mirrors the session into a signal.
/// Wrap your app with this component; children render once the session is resolved.
#[component]
pub fn SessionProvider(config: NotekeepConfig, children: Element) -> Element {
    let backend = use_context_provider(|| Backend::connect(&config));
    let mut state = use_signal(|| backend.session.state());
    use_context_provider(|| state);

    use_hook(|| {
        let session = backend.session.clone();
        spawn(async move {
            session.listen().await;
        });
        spawn(backend.clone().keep_fresh());

        let mut changes = backend.session.changes();
        spawn(async move {
            loop {
                let next = changes.borrow_and_update().clone();
                if *state.peek() != next {
                    state.set(next);
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });
    });

    if !state().is_resolved() {
        return rsx! {
            div { class: "session-loading", "Loading..." }
        };
    }

    rsx! {
        {children}
    }
}
