//! Identity provider port and its in-memory implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::error::{AuthCreationError, AuthCredentialError};
use crate::models::UserIdentity;

/// Minimum password length accepted by [`MemoryAuth`].
pub const MIN_PASSWORD_LEN: usize = 6;
/// Consecutive failed sign-ins after which [`MemoryAuth`] throttles an email.
pub const MAX_FAILED_SIGN_INS: u32 = 5;

/// Async trait for the hosted identity provider.
///
/// Creating an identity or signing in also makes it the current identity, which
/// every receiver from [`subscribe`](AuthProvider::subscribe) observes.
pub trait AuthProvider {
    fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserIdentity, AuthCreationError>>;
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserIdentity, AuthCredentialError>>;
    /// Drop the current identity. Signing out twice is harmless.
    fn sign_out(&self) -> impl Future<Output = ()>;
    /// Follow the current identity. The value present at subscription time is
    /// already marked as seen.
    fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>>;
    /// Bring back an identity saved by an earlier run, if any. The session calls
    /// this once before it starts listening.
    fn restore(&self) -> impl Future<Output = ()> {
        async {}
    }
}

/// Rough shape check: `local@domain.tld`, no whitespace.
pub fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug)]
struct Account {
    uid: String,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    failures: HashMap<String, u32>,
}

/// In-memory AuthProvider for testing and native builds.
#[derive(Clone, Debug)]
pub struct MemoryAuth {
    accounts: Arc<Mutex<Accounts>>,
    current: Arc<watch::Sender<Option<UserIdentity>>>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            accounts: Arc::default(),
            current: Arc::new(tx),
        }
    }
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<UserIdentity> {
        self.current.borrow().clone()
    }

    fn publish(&self, identity: Option<UserIdentity>) {
        self.current.send_replace(identity);
    }
}

impl AuthProvider for MemoryAuth {
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, AuthCreationError> {
        let key = email.trim().to_lowercase();
        if !looks_like_email(&key) {
            return Err(AuthCreationError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthCreationError::WeakPassword);
        }

        let identity = {
            let mut accounts = self
                .accounts
                .lock()
                .map_err(|_| AuthCreationError::Backend("account table poisoned".to_string()))?;
            if accounts.by_email.contains_key(&key) {
                return Err(AuthCreationError::EmailInUse);
            }
            let account = Account {
                uid: uuid::Uuid::new_v4().simple().to_string(),
                email: key.clone(),
                password: password.to_string(),
            };
            let identity = UserIdentity {
                uid: account.uid.clone(),
                email: account.email.clone(),
            };
            accounts.by_email.insert(key, account);
            identity
        };

        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthCredentialError> {
        let key = email.trim().to_lowercase();
        if !looks_like_email(&key) {
            return Err(AuthCredentialError::InvalidEmail);
        }

        let identity = {
            let mut accounts = self
                .accounts
                .lock()
                .map_err(|_| AuthCredentialError::Backend("account table poisoned".to_string()))?;
            if accounts.failures.get(&key).copied().unwrap_or(0) >= MAX_FAILED_SIGN_INS {
                return Err(AuthCredentialError::TooManyRequests);
            }
            let Some(account) = accounts.by_email.get(&key) else {
                return Err(AuthCredentialError::UserNotFound);
            };
            if account.password != password {
                *accounts.failures.entry(key).or_default() += 1;
                return Err(AuthCredentialError::WrongPassword);
            }
            let identity = UserIdentity {
                uid: account.uid.clone(),
                email: account.email.clone(),
            };
            accounts.failures.remove(&key);
            identity
        };

        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) {
        self.publish(None);
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("a@b@c.co"));
        assert!(!looks_like_email("a@.co"));
    }

    #[tokio::test]
    async fn test_create_and_sign_in() {
        let auth = MemoryAuth::new();
        let created = auth.create_identity("Ada@Example.com", "secret1").await.unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert_eq!(auth.current(), Some(created.clone()));

        auth.sign_out().await;
        assert_eq!(auth.current(), None);

        let signed_in = auth.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.uid, created.uid);
    }

    #[tokio::test]
    async fn test_creation_errors() {
        let auth = MemoryAuth::new();
        assert_eq!(
            auth.create_identity("nope", "secret1").await,
            Err(AuthCreationError::InvalidEmail)
        );
        assert_eq!(
            auth.create_identity("a@b.co", "12345").await,
            Err(AuthCreationError::WeakPassword)
        );
        auth.create_identity("a@b.co", "123456").await.unwrap();
        assert_eq!(
            auth.create_identity("A@B.CO", "654321").await,
            Err(AuthCreationError::EmailInUse)
        );
    }

    #[tokio::test]
    async fn test_credential_errors_and_throttling() {
        let auth = MemoryAuth::new();
        auth.create_identity("a@b.co", "123456").await.unwrap();
        auth.sign_out().await;

        assert_eq!(
            auth.sign_in("x@b.co", "123456").await,
            Err(AuthCredentialError::UserNotFound)
        );
        assert_eq!(
            auth.sign_in("a@b", "123456").await,
            Err(AuthCredentialError::InvalidEmail)
        );
        for _ in 0..MAX_FAILED_SIGN_INS {
            assert_eq!(
                auth.sign_in("a@b.co", "wrong!").await,
                Err(AuthCredentialError::WrongPassword)
            );
        }
        assert_eq!(
            auth.sign_in("a@b.co", "123456").await,
            Err(AuthCredentialError::TooManyRequests)
        );
        assert_eq!(auth.current(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let auth = MemoryAuth::new();
        let mut rx = auth.subscribe();
        assert_eq!(*rx.borrow_and_update(), None);

        auth.create_identity("a@b.co", "123456").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        auth.sign_out().await;
        auth.sign_out().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
