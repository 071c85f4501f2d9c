//! Client-side error taxonomy.
//!
//! Mirrors the server's status codes so a caller can branch on the kind
//! (re-prompt on validation, abort on conflict, retry on transport).

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Server error body: `{"errors": [..]}` or `{"error": ".."}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
    error: Option<String>,
}

impl ClientError {
    /// Classify a non-success response.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let body: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        let message = body
            .error
            .clone()
            .or_else(|| body.errors.first().cloned())
            .unwrap_or_else(|| format!("HTTP {status}"));

        match status {
            400 | 422 => {
                if body.errors.is_empty() {
                    ClientError::Validation(vec![message])
                } else {
                    ClientError::Validation(body.errors)
                }
            }
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            _ => ClientError::Server { status, message },
        }
    }

    /// Worth another attempt: the request may not have reached the server or
    /// the server failed transiently.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout | ClientError::Transport(_) => true,
            ClientError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
