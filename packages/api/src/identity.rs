//! # Hosted identity provider
//!
//! [`FirebaseAuth`] talks to the Identity Toolkit REST API with the project's
//! web API key:
//!
//! - `accounts:signUp` creates an email/password account,
//! - `accounts:signInWithPassword` signs an existing one in,
//! - the secure token service trades a refresh token for a fresh ID token.
//!
//! Tokens live in the shared [`Credentials`] so the document database adapter can
//! authorise its requests as the same user. ID tokens expire after an hour;
//! [`Credentials::bearer`] refreshes them shortly before that. The refresh token
//! is saved (see [`crate::persist`]) so a reload signs the user back in. Provider
//! error codes are mapped onto [`AuthCreationError`] / [`AuthCredentialError`].

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;

use store::{AuthCreationError, AuthCredentialError, AuthProvider, UserIdentity};

use crate::persist::{self, SavedSession};
use crate::rest::{self, RestError};

pub const IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";
pub const TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1/token";

/// ID tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone, Debug, PartialEq)]
struct Tokens {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Tokens {
    fn new(id_token: String, refresh_token: String, expires_in: i64, now: DateTime<Utc>) -> Self {
        Self {
            id_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// The provider sends `expiresIn` as a decimal string.
fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    refresh_token: String,
    #[serde(deserialize_with = "seconds")]
    expires_in: i64,
}

/// Reply of the secure token service. Unlike the account calls it uses snake_case.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    #[serde(deserialize_with = "seconds")]
    expires_in: i64,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

/// Tokens and identity of the signed-in user, shared between adapters.
#[derive(Clone, Debug)]
pub struct Credentials {
    http: reqwest::Client,
    token_endpoint: String,
    api_key: String,
    tokens: Arc<RwLock<Option<Tokens>>>,
    current: Arc<watch::Sender<Option<UserIdentity>>>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(TOKEN_ENDPOINT, api_key)
    }

    pub fn with_endpoint(token_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            token_endpoint: token_endpoint.into(),
            api_key: api_key.into(),
            tokens: Arc::default(),
            current: Arc::new(current),
        }
    }

    fn refresh_url(&self) -> String {
        format!("{}?key={}", self.token_endpoint, self.api_key)
    }

    fn tokens(&self) -> Option<Tokens> {
        self.tokens.read().ok().and_then(|t| t.clone())
    }

    fn set_tokens(&self, tokens: Option<Tokens>) {
        if let Ok(mut slot) = self.tokens.write() {
            *slot = tokens;
        }
    }

    fn identity(&self) -> Option<UserIdentity> {
        self.current.borrow().clone()
    }

    /// A usable ID token, refreshed first when it is about to expire.
    ///
    /// A refresh the provider rejects signs the user out.
    pub async fn bearer(&self) -> Option<String> {
        let tokens = self.tokens()?;
        if !tokens.is_stale(Utc::now()) {
            return Some(tokens.id_token);
        }
        let identity = self.identity()?;
        match self.exchange(&tokens.refresh_token).await {
            Ok((uid, fresh)) if uid == identity.uid => {
                let id_token = fresh.id_token.clone();
                self.establish(identity, fresh);
                tracing::debug!("id token refreshed");
                Some(id_token)
            }
            Ok((uid, _)) => {
                tracing::warn!(%uid, expected = %identity.uid, "refresh returned another user");
                self.clear();
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "id token refresh failed, signing out");
                self.clear();
                None
            }
        }
    }

    /// Trade a refresh token for a new ID token.
    async fn exchange(&self, refresh_token: &str) -> Result<(String, Tokens), RestError> {
        let body = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token,
        };
        let reply: RefreshResponse =
            rest::send_json(self.http.post(self.refresh_url()).form(&body)).await?;
        let tokens = Tokens::new(reply.id_token, reply.refresh_token, reply.expires_in, Utc::now());
        Ok((reply.user_id, tokens))
    }

    /// Make `identity` current with `tokens`, and save it for the next start.
    fn establish(&self, identity: UserIdentity, tokens: Tokens) {
        persist::save(&SavedSession {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            refresh_token: tokens.refresh_token.clone(),
        });
        self.set_tokens(Some(tokens));
        self.current.send_if_modified(|current| {
            if current.as_ref() == Some(&identity) {
                false
            } else {
                *current = Some(identity);
                true
            }
        });
    }

    fn clear(&self) {
        persist::clear();
        self.set_tokens(None);
        self.current.send_replace(None);
    }

    /// Sign the saved user back in, if there is one.
    async fn restore(&self) {
        let Some(saved) = persist::load() else {
            return;
        };
        match self.exchange(&saved.refresh_token).await {
            Ok((uid, tokens)) if uid == saved.uid => {
                tracing::info!(%uid, "session restored");
                self.establish(UserIdentity { uid, email: saved.email }, tokens);
            }
            Ok((uid, _)) => {
                tracing::warn!(%uid, expected = %saved.uid, "saved session belongs to another user");
                persist::clear();
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not restore saved session");
                persist::clear();
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    credentials: Credentials,
}

impl FirebaseAuth {
    pub fn new(api_key: impl Into<String>, credentials: Credentials) -> Self {
        Self::with_endpoint(IDENTITY_ENDPOINT, api_key, credentials)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            credentials,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/accounts:{method}?key={}", self.endpoint, self.api_key)
    }

    async fn password_call(&self, method: &str, email: &str, password: &str) -> Result<UserIdentity, RestError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account: AccountResponse =
            rest::send_json(self.http.post(self.method_url(method)).json(&body)).await?;
        let identity = UserIdentity {
            uid: account.local_id,
            email: if account.email.is_empty() {
                email.to_string()
            } else {
                account.email
            },
        };
        let tokens = Tokens::new(account.id_token, account.refresh_token, account.expires_in, Utc::now());
        self.credentials.establish(identity.clone(), tokens);
        tracing::info!(uid = %identity.uid, %method, "identity established");
        Ok(identity)
    }
}

fn creation_error(err: RestError) -> AuthCreationError {
    match err.code() {
        Some("EMAIL_EXISTS") => AuthCreationError::EmailInUse,
        Some("WEAK_PASSWORD") => AuthCreationError::WeakPassword,
        Some("INVALID_EMAIL") | Some("MISSING_EMAIL") => AuthCreationError::InvalidEmail,
        _ => AuthCreationError::Backend(err.to_string()),
    }
}

fn credential_error(err: RestError) -> AuthCredentialError {
    match err.code() {
        Some("EMAIL_NOT_FOUND") => AuthCredentialError::UserNotFound,
        Some("INVALID_PASSWORD") | Some("INVALID_LOGIN_CREDENTIALS") => AuthCredentialError::WrongPassword,
        Some("INVALID_EMAIL") | Some("MISSING_EMAIL") => AuthCredentialError::InvalidEmail,
        Some("TOO_MANY_ATTEMPTS_TRY_LATER") => AuthCredentialError::TooManyRequests,
        _ => AuthCredentialError::Backend(err.to_string()),
    }
}

impl AuthProvider for FirebaseAuth {
    async fn create_identity(&self, email: &str, password: &str) -> Result<UserIdentity, AuthCreationError> {
        self.password_call("signUp", email, password)
            .await
            .map_err(creation_error)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthCredentialError> {
        self.password_call("signInWithPassword", email, password)
            .await
            .map_err(credential_error)
    }

    async fn sign_out(&self) {
        self.credentials.clear();
        tracing::info!("signed out");
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.credentials.current.subscribe()
    }

    async fn restore(&self) {
        self.credentials.restore().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn rejected(message: &str) -> RestError {
        RestError::from_body(
            StatusCode::BAD_REQUEST,
            &format!(r#"{{"error":{{"code":400,"message":"{message}"}}}}"#),
        )
    }

    #[test]
    fn test_creation_codes() {
        assert_eq!(creation_error(rejected("EMAIL_EXISTS")), AuthCreationError::EmailInUse);
        assert_eq!(
            creation_error(rejected("WEAK_PASSWORD : Password should be at least 6 characters")),
            AuthCreationError::WeakPassword
        );
        assert_eq!(creation_error(rejected("INVALID_EMAIL")), AuthCreationError::InvalidEmail);
        assert!(matches!(
            creation_error(rejected("OPERATION_NOT_ALLOWED")),
            AuthCreationError::Backend(_)
        ));
    }

    #[test]
    fn test_credential_codes() {
        assert_eq!(credential_error(rejected("EMAIL_NOT_FOUND")), AuthCredentialError::UserNotFound);
        assert_eq!(credential_error(rejected("INVALID_PASSWORD")), AuthCredentialError::WrongPassword);
        assert_eq!(
            credential_error(rejected("INVALID_LOGIN_CREDENTIALS")),
            AuthCredentialError::WrongPassword
        );
        assert_eq!(
            credential_error(rejected("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled")),
            AuthCredentialError::TooManyRequests
        );
        assert!(matches!(
            credential_error(RestError::Decode("eof".into())),
            AuthCredentialError::Backend(_)
        ));
    }

    #[test]
    fn test_method_url() {
        let auth = FirebaseAuth::new("k3y", Credentials::new("k3y"));
        assert_eq!(
            auth.method_url("signUp"),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=k3y"
        );
        assert_eq!(
            Credentials::new("k3y").refresh_url(),
            "https://securetoken.googleapis.com/v1/token?key=k3y"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(PasswordRequest {
            email: "a@b.co",
            password: "secret",
            return_secure_token: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "email": "a@b.co", "password": "secret", "returnSecureToken": true })
        );
    }

    #[test]
    fn test_account_response_keeps_refresh_token() {
        let account: AccountResponse = serde_json::from_value(serde_json::json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "u1",
            "email": "ada@example.com",
            "idToken": "id-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600",
            "registered": true
        }))
        .unwrap();
        assert_eq!(account.refresh_token, "refresh-1");
        assert_eq!(account.expires_in, 3600);
    }

    #[test]
    fn test_refresh_response_is_snake_case() {
        let reply: RefreshResponse = serde_json::from_value(serde_json::json!({
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "refresh-2",
            "id_token": "id-2",
            "user_id": "u1",
            "project_id": "1234"
        }))
        .unwrap();
        assert_eq!(reply.user_id, "u1");
        assert_eq!(reply.id_token, "id-2");
        assert_eq!(reply.expires_in, 3600);

        assert!(serde_json::from_value::<RefreshResponse>(serde_json::json!({
            "expires_in": "soon", "refresh_token": "r", "id_token": "i", "user_id": "u"
        }))
        .is_err());
    }

    #[test]
    fn test_refresh_request_is_a_form() {
        let body = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token: "r/1+2",
        };
        let request = reqwest::Client::new()
            .post("https://securetoken.googleapis.com/v1/token?key=k")
            .form(&body)
            .build()
            .unwrap();
        let sent = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(sent, b"grant_type=refresh_token&refresh_token=r%2F1%2B2");
    }

    #[test]
    fn test_tokens_go_stale_a_minute_early() {
        let now = Utc::now();
        let tokens = Tokens::new("id".into(), "r".into(), 3600, now);
        assert!(!tokens.is_stale(now));
        assert!(!tokens.is_stale(now + Duration::seconds(3600 - EXPIRY_MARGIN_SECS - 1)));
        assert!(tokens.is_stale(now + Duration::seconds(3600 - EXPIRY_MARGIN_SECS)));
        assert!(tokens.is_stale(now + Duration::seconds(7200)));
    }

    #[tokio::test]
    async fn test_fresh_token_is_used_without_refresh() {
        let credentials = Credentials::with_endpoint("http://127.0.0.1:9", "k");
        assert_eq!(credentials.bearer().await, None);

        credentials.set_tokens(Some(Tokens::new("id-1".into(), "r".into(), 3600, Utc::now())));
        credentials.current.send_replace(Some(UserIdentity {
            uid: "u1".to_string(),
            email: "a@b.co".to_string(),
        }));
        assert_eq!(credentials.bearer().await.as_deref(), Some("id-1"));
    }

    #[tokio::test]
    async fn test_failed_refresh_signs_out() {
        // Nothing listens on the discard port, so the exchange fails
        let credentials = Credentials::with_endpoint("http://127.0.0.1:9", "k");
        credentials.set_tokens(Some(Tokens::new("old".into(), "r".into(), 0, Utc::now())));
        credentials.current.send_replace(Some(UserIdentity {
            uid: "u1".to_string(),
            email: "a@b.co".to_string(),
        }));
        let mut rx = credentials.current.subscribe();

        assert_eq!(credentials.bearer().await, None);
        assert!(credentials.tokens().is_none());
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_token_and_identity() {
        let credentials = Credentials::new("k");
        credentials.set_tokens(Some(Tokens::new("abc".into(), "r".into(), 3600, Utc::now())));
        let auth = FirebaseAuth::new("k", credentials.clone());
        credentials.current.send_replace(Some(UserIdentity {
            uid: "u1".to_string(),
            email: "a@b.co".to_string(),
        }));
        let mut rx = auth.subscribe();

        auth.sign_out().await;
        assert!(credentials.bearer().await.is_none());
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
