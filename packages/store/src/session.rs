//! # Session store: who is signed in, and their profile
//!
//! [`SessionStore`] mirrors the identity provider into a [`SessionState`] published on
//! a `tokio::sync::watch` channel. The state only moves when the provider reports a
//! change (processed by [`listen`](SessionStore::listen)) or when a sign-up completes:
//!
//! ```text
//! Uninitialized ──first notification──▶ Resolving ──▶ Authenticated { identity, profile }
//!                                                 └─▶ Anonymous
//! ```
//!
//! After the first notification the state never returns to `Resolving`; later
//! notifications go straight to one of the resolved states. Views hold back
//! rendering until [`SessionState::is_resolved`] so the signed-out UI never flashes
//! for a user who is in fact signed in.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::auth::AuthProvider;
use crate::error::{AuthCreationError, AuthCredentialError};
use crate::models::{
    check_credentials, normalize_email, parse_budget, SignupForm, UserIdentity, UserProfile,
};
use crate::repo::{DocumentStore, Repository};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Resolving,
    Authenticated {
        identity: UserIdentity,
        profile: Option<UserProfile>,
    },
    Anonymous,
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Authenticated { .. } | Self::Anonymous)
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            Self::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.identity().map(|i| i.uid.as_str())
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }
}

/// Signed-in identity and profile, kept in sync with an [`AuthProvider`].
#[derive(Clone)]
pub struct SessionStore<A: AuthProvider, S: DocumentStore> {
    auth: A,
    repo: Repository<S>,
    state: Arc<watch::Sender<SessionState>>,
}

impl<A: AuthProvider, S: DocumentStore> SessionStore<A, S> {
    pub fn new(auth: A, repo: Repository<S>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            auth,
            repo,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn changes(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn repo(&self) -> &Repository<S> {
        &self.repo
    }

    /// Process identity notifications until the provider goes away.
    ///
    /// A persisted identity is restored first; the provider's current identity
    /// then counts as the first notification.
    pub async fn listen(&self) {
        self.auth.restore().await;
        let mut identities = self.auth.subscribe();
        loop {
            let identity = identities.borrow_and_update().clone();
            self.apply(identity).await;
            if identities.changed().await.is_err() {
                tracing::debug!("identity provider closed, session listener stopping");
                break;
            }
        }
    }

    async fn apply(&self, identity: Option<UserIdentity>) {
        self.state.send_if_modified(|state| {
            if *state == SessionState::Uninitialized {
                *state = SessionState::Resolving;
                true
            } else {
                false
            }
        });

        let next = match identity {
            None => SessionState::Anonymous,
            Some(identity) => {
                let fetched = match self.repo.get_profile(&identity.uid).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        tracing::warn!(uid = %identity.uid, error = %e, "could not load profile");
                        None
                    }
                };
                // A profile written by signup may not be readable yet.
                let profile = fetched.or_else(|| self.cached_profile(&identity.uid));
                SessionState::Authenticated { identity, profile }
            }
        };

        match &next {
            SessionState::Authenticated { identity, .. } => {
                tracing::info!(uid = %identity.uid, "session resolved: signed in")
            }
            _ => tracing::info!("session resolved: signed out"),
        }
        self.state.send_replace(next);
    }

    fn cached_profile(&self, uid: &str) -> Option<UserProfile> {
        self.state
            .borrow()
            .profile()
            .filter(|p| p.uid == uid)
            .cloned()
    }

    /// Create an account, store its profile, and sign it in.
    pub async fn signup(&self, form: &SignupForm) -> Result<UserIdentity, AuthCreationError> {
        form.validate()?;
        let email = normalize_email(&form.email);
        let identity = self.auth.create_identity(&email, &form.password).await?;

        let profile = UserProfile {
            uid: identity.uid.clone(),
            name: form.name.trim().to_string(),
            email,
            monthly_budget: parse_budget(&form.monthly_budget),
            created_at: Utc::now(),
        };
        self.repo
            .put_profile(&profile)
            .await
            .map_err(AuthCreationError::Profile)?;

        tracing::info!(uid = %identity.uid, "account created");
        self.state.send_replace(SessionState::Authenticated {
            identity: identity.clone(),
            profile: Some(profile),
        });
        Ok(identity)
    }

    /// Sign in. The session state follows once the provider reports the change.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity, AuthCredentialError> {
        check_credentials(email, password)?;
        let identity = self.auth.sign_in(email.trim(), password).await?;
        tracing::debug!(uid = %identity.uid, "signed in");
        Ok(identity)
    }

    pub async fn logout(&self) {
        self.auth.sign_out().await;
    }
}
