//! Login page view with an email/password form.

use dioxus::prelude::*;
use store::check_credentials;
use ui::components::{Button, ErrorBanner, Input};
use ui::{use_backend, use_session};

use crate::Route;

#[component]
pub fn Login() -> Element {
    let backend = use_backend();
    let session = use_session();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    // The session follows a successful sign-in; this is where the page moves on
    if session().identity().is_some() {
        nav.replace(Route::Dashboard {});
    }

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        if loading() {
            return;
        }
        let (e, p) = (email(), password());
        if let Err(missing) = check_credentials(&e, &p) {
            error.set(Some(missing.user_message().to_string()));
            return;
        }
        let session = backend.session.clone();
        spawn(async move {
            error.set(None);
            loading.set(true);
            if let Err(err) = session.login(&e, &p).await {
                tracing::error!(error = %err, "login failed");
                error.set(Some(err.user_message().to_string()));
                loading.set(false);
            }
        });
    };

    rsx! {
        div {
            class: "page-center",

            h1 { class: "page-title", "Welcome back" }
            p { class: "page-subtitle", "Log in to your notes" }

            form {
                onsubmit: handle_login,
                class: "auth-form",

                if let Some(err) = error() {
                    ErrorBanner { message: err }
                }

                Input {
                    kind: "email",
                    placeholder: "Email",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }
                Input {
                    kind: "password",
                    placeholder: "Password",
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                Button {
                    submit: true,
                    disabled: loading(),
                    if loading() { "Logging in..." } else { "Log In" }
                }
            }

            p {
                class: "page-footer",
                "No account yet? "
                Link { class: "text-link", to: Route::SignUp {}, "Sign up" }
            }
        }
    }
}
