use dioxus::prelude::*;

use store::access::{self, Access};
use store::NotekeepConfig;
use ui::{use_session, SessionProvider};
use views::{CreateNote, Dashboard, EditNote, Login, SignUp};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    SignUp {},
    #[route("/login")]
    Login {},
    #[layout(Protected)]
        #[route("/dashboard")]
        Dashboard {},
        #[route("/create")]
        CreateNote {},
        #[route("/edit/:id")]
        EditNote { id: String },
    #[end_layout]
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

/// Deployment settings compiled into the bundle.
const NOTEKEEP_TOML: &str = include_str!("../notekeep.toml");

fn load_config() -> NotekeepConfig {
    NotekeepConfig::from_toml(NOTEKEEP_TOML).unwrap_or_else(|e| {
        tracing::warn!(error = %e, file = NotekeepConfig::filename(), "invalid config, using defaults");
        NotekeepConfig::default()
    })
}

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let config = use_hook(load_config);

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        SessionProvider {
            config,
            Router::<Route> {}
        }
    }
}

/// Layout for the signed-in pages. Anonymous visitors are sent to `/login`.
#[component]
fn Protected() -> Element {
    let session = use_session();
    let route = use_route::<Route>();
    let nav = use_navigator();

    match access::resolve(&route.to_string(), &session()) {
        Access::Render => rsx! { Outlet::<Route> {} },
        Access::Wait => rsx! {},
        Access::Redirect(path) => {
            tracing::debug!(from = %route, to = path, "redirecting anonymous visitor");
            nav.replace(path);
            rsx! {}
        }
    }
}

#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div {
            class: "page-center",
            h1 { class: "page-title", "Page not found" }
            p { class: "page-subtitle", "Nothing lives at /{path}." }
            Link { class: "text-link", to: Route::Dashboard {}, "Back to your notes" }
        }
    }
}
