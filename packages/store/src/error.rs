//! # Error taxonomy
//!
//! Every fallible operation in Notekeep returns one of the enums below. They are
//! grouped by the user action that triggers them, so a view can turn any of them
//! into a banner with [`user_message`](AuthCreationError::user_message) and move on.
//! Nothing here is retried automatically.
//!
//! | Enum | Raised by |
//! |------|-----------|
//! | [`MissingField`] | sign-up or login with a required field left blank |
//! | [`AuthCreationError`] | sign-up (identity creation or profile write) |
//! | [`AuthCredentialError`] | login |
//! | [`StoreError`] | any document store read, write, or subscription |
//! | [`SaveError`] | note create/update |
//! | [`UploadError`] | image upload to the media host |
//! | [`EditorError`] | the note editor's save action, wrapping the two above |

use thiserror::Error;

/// A required form field was left blank. Checked before any provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingField {
    #[error("name is required")]
    Name,

    #[error("email is required")]
    Email,

    #[error("password is required")]
    Password,
}

impl MissingField {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Name => "Name is required",
            Self::Email => "Email is required",
            Self::Password => "Password is required",
        }
    }
}

/// Failure while creating a new account.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthCreationError {
    #[error(transparent)]
    Missing(#[from] MissingField),

    #[error("email address is already registered")]
    EmailInUse,

    #[error("password does not meet the strength policy")]
    WeakPassword,

    #[error("email address is malformed")]
    InvalidEmail,

    #[error("could not store the user profile: {0}")]
    Profile(#[source] StoreError),

    #[error("identity provider error: {0}")]
    Backend(String),
}

impl AuthCreationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Missing(field) => field.user_message(),
            Self::EmailInUse => "Email already registered. Please login.",
            Self::WeakPassword => "Password must be at least 6 characters.",
            Self::InvalidEmail => "Invalid email format.",
            Self::Profile(_) | Self::Backend(_) => "Something went wrong. Try again.",
        }
    }
}

/// Failure while signing in with email and password.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthCredentialError {
    #[error(transparent)]
    Missing(#[from] MissingField),

    #[error("no account exists for this email")]
    UserNotFound,

    #[error("password is incorrect")]
    WrongPassword,

    #[error("email address is malformed")]
    InvalidEmail,

    #[error("too many failed attempts")]
    TooManyRequests,

    #[error("identity provider error: {0}")]
    Backend(String),
}

impl AuthCredentialError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Missing(field) => field.user_message(),
            Self::UserNotFound => "No account found with this email.",
            Self::WrongPassword => "Incorrect password.",
            Self::InvalidEmail => "Invalid email format.",
            Self::TooManyRequests => "Too many attempts. Try again later.",
            Self::Backend(_) => "Login failed. Please try again.",
        }
    }
}

/// Failure reported by a [`crate::DocumentStore`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("could not decode document: {0}")]
    Decode(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failure while persisting a note.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    #[error("note {0} no longer exists")]
    Missing(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Failure while uploading an image to the media host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Transport(String),

    #[error("media host rejected the upload: {0}")]
    Rejected(String),

    #[error("media host response is missing a secure url")]
    MissingUrl,
}

/// Failure of the note editor's save action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("title, content and category are required")]
    MissingFields,

    #[error("no user is signed in")]
    NotSignedIn,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

impl EditorError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingFields => "Please fill in title, content and category.",
            Self::NotSignedIn => "Your session has ended. Please log in again.",
            Self::Upload(_) => "Image upload failed. The note was not saved.",
            Self::Save(_) => "Could not save the note. Try again.",
        }
    }
}

/// A category name that is not one of the four known categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);
