//! Sign-up page: name, email, password twice, and a monthly budget.

use dioxus::prelude::*;
use store::SignupForm;
use ui::components::{Button, ErrorBanner, Input};
use ui::{use_backend, use_session};

use crate::Route;

#[component]
pub fn SignUp() -> Element {
    let backend = use_backend();
    let session = use_session();
    let nav = use_navigator();
    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm_password = use_signal(String::new);
    let mut budget = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    // Signed in (including right after a successful sign-up): go to the notes
    if session().identity().is_some() {
        nav.replace(Route::Dashboard {});
    }

    let handle_signup = move |evt: FormEvent| {
        evt.prevent_default();
        if loading() {
            return;
        }
        let form = SignupForm {
            name: name(),
            email: email(),
            password: password(),
            monthly_budget: budget(),
        };
        if let Err(missing) = form.validate() {
            error.set(Some(missing.user_message().to_string()));
            return;
        }
        if password() != confirm_password() {
            error.set(Some("Passwords do not match.".to_string()));
            return;
        }
        let session = backend.session.clone();
        spawn(async move {
            error.set(None);
            loading.set(true);
            if let Err(e) = session.signup(&form).await {
                tracing::error!(error = %e, "sign-up failed");
                error.set(Some(e.user_message().to_string()));
                loading.set(false);
            }
        });
    };

    rsx! {
        div {
            class: "page-center",

            h1 { class: "page-title", "Create Account" }
            p { class: "page-subtitle", "Sign up to start keeping notes" }

            form {
                onsubmit: handle_signup,
                class: "auth-form",

                if let Some(err) = error() {
                    ErrorBanner { message: err }
                }

                Input {
                    placeholder: "Name",
                    value: name(),
                    oninput: move |evt: FormEvent| name.set(evt.value()),
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
                Input {
                    kind: "password",
                    placeholder: "Confirm password",
                    value: confirm_password(),
                    oninput: move |evt: FormEvent| confirm_password.set(evt.value()),
                }
                Input {
                    kind: "number",
                    placeholder: "Monthly budget",
                    value: budget(),
                    oninput: move |evt: FormEvent| budget.set(evt.value()),
                }

                Button {
                    submit: true,
                    disabled: loading(),
                    if loading() { "Creating account..." } else { "Sign Up" }
                }
            }

            p {
                class: "page-footer",
                "Already have an account? "
                Link { class: "text-link", to: Route::Login {}, "Log in" }
            }
        }
    }
}
