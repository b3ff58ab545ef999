//! Shared plumbing for the Google-style REST endpoints.
//!
//! Both the identity service and the document database report failures as
//!
//! ```json
//! { "error": { "code": 400, "message": "EMAIL_EXISTS", "status": "INVALID_ARGUMENT" } }
//! ```
//!
//! [`RestError`] carries that envelope (or the transport failure that prevented
//! one) until an adapter maps it onto the store's error taxonomy.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use store::StoreError;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl RestError {
    /// Build a status error from a response body, falling back to the raw text.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Self::Status { status, message }
    }

    /// The provider's machine code, e.g. `WEAK_PASSWORD` out of
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message
                .split(|c: char| c == ' ' || c == ':')
                .next()
                .filter(|code| !code.is_empty()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            Self::Decode(_) => None,
        }
    }
}

impl From<RestError> for StoreError {
    fn from(err: RestError) -> Self {
        match err.status() {
            Some(StatusCode::NOT_FOUND) => StoreError::NotFound(err.to_string()),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                StoreError::PermissionDenied(err.to_string())
            }
            _ => match err {
                RestError::Decode(msg) => StoreError::Decode(msg),
                other => StoreError::Backend(other.to_string()),
            },
        }
    }
}

/// Send `request` and return the successful response, or the error envelope.
pub async fn send(request: RequestBuilder) -> Result<Response, RestError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, %body, "rest call failed");
    Err(RestError::from_body(status, &body))
}

/// Send `request` and decode a JSON response body.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RestError> {
    let text = send(request).await?.text().await?;
    serde_json::from_str(&text).map_err(|e| RestError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_code() {
        let err = RestError::from_body(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"WEAK_PASSWORD : Password should be at least 6 characters","status":"INVALID_ARGUMENT"}}"#,
        );
        assert_eq!(err.code(), Some("WEAK_PASSWORD"));

        let err = RestError::from_body(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"EMAIL_EXISTS"}}"#,
        );
        assert_eq!(err.code(), Some("EMAIL_EXISTS"));
    }

    #[test]
    fn test_non_json_body() {
        let err = RestError::from_body(StatusCode::BAD_GATEWAY, "  upstream down\n");
        assert_eq!(err.to_string(), "502 Bad Gateway: upstream down");
    }

    #[test]
    fn test_store_error_mapping() {
        let not_found = RestError::from_body(StatusCode::NOT_FOUND, "{}");
        assert!(matches!(StoreError::from(not_found), StoreError::NotFound(_)));

        let denied = RestError::from_body(
            StatusCode::FORBIDDEN,
            r#"{"error":{"message":"Missing or insufficient permissions."}}"#,
        );
        assert!(matches!(StoreError::from(denied), StoreError::PermissionDenied(_)));

        let decode = RestError::Decode("eof".to_string());
        assert_eq!(StoreError::from(decode), StoreError::Decode("eof".to_string()));

        let other = RestError::from_body(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(StoreError::from(other), StoreError::Backend(_)));
    }
}
