//! # API crate: hosted service adapters for Notekeep
//!
//! The `store` crate defines three async ports; this crate implements them
//! against the hosted services a deployed Notekeep talks to.
//!
//! | Module | Implements | Service |
//! |--------|-----------|---------|
//! | [`identity`] | [`store::AuthProvider`] | Identity Toolkit REST (email/password accounts) |
//! | [`firestore`] | [`store::DocumentStore`] | Cloud Firestore v1 REST |
//! | [`media`] | [`store::MediaHost`] | Cloudinary unsigned upload |
//!
//! [`Hosted::connect`] wires all three from a [`NotekeepConfig`], sharing one
//! [`Credentials`] so database calls run as the signed-in user. [`persist`] keeps
//! the sign-in across restarts.

use store::NotekeepConfig;

pub mod firestore;
pub mod identity;
pub mod media;
pub mod persist;
mod rest;
mod value;

pub use firestore::Firestore;
pub use identity::{Credentials, FirebaseAuth};
pub use media::Cloudinary;
pub use rest::RestError;

/// The three hosted adapters of one deployment.
#[derive(Clone, Debug)]
pub struct Hosted {
    pub auth: FirebaseAuth,
    pub store: Firestore,
    pub media: Cloudinary,
}

impl Hosted {
    pub fn connect(config: &NotekeepConfig) -> Self {
        if !config.firebase.is_configured() {
            tracing::warn!("firebase api_key/project_id missing; hosted calls will fail");
        }
        let credentials = Credentials::new(config.firebase.api_key.clone());
        Self {
            auth: FirebaseAuth::new(config.firebase.api_key.clone(), credentials.clone()),
            store: Firestore::new(config.firebase.project_id.clone(), credentials),
            media: Cloudinary::new(&config.media),
        }
    }
}
