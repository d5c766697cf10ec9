//! Errors raised by the remote canvas service

use thiserror::Error;

/// Errors that can occur while talking to the remote canvas service
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The access token was rejected; the user has to sign in again
    #[error("authorization expired")]
    AuthorizationExpired,

    /// Transport-level failure (connection, timeout, TLS)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status this client does not handle
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A response was missing a field this client relies on
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },

    /// A response body was not valid JSON
    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),
}

impl RemoteError {
    /// Create a malformed response error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }

    pub fn is_authorization_expired(&self) -> bool {
        matches!(self, Self::AuthorizationExpired)
    }
}
