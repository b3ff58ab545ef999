//! This crate contains all shared UI for the workspace.

pub mod components;
pub mod views;

mod backend;
pub use backend::{use_backend, Backend, Db, Media};

mod session;
pub use session::{use_session, SessionProvider};
