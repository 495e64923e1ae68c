//! Error types for the video generation API client.
//!
//! # Design
//! Failures fall into three groups: no response at all (`Network`,
//! `Timeout`), a response with a non-2xx status (`Status`), and local
//! encode/decode problems. `Status` keeps the complete `HttpResponse` so the
//! server's structured error body reaches the caller untouched.

use crate::http::HttpResponse;

/// Boxed transport failure, kept opaque so any `Transport` can report its own
/// error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `VideoClient` operations and parse helpers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[source] BoxError),

    /// No response arrived before the configured timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(#[source] BoxError),

    /// The server answered with a non-2xx status.
    #[error("request failed with status code {status}")]
    Status { status: u16, response: HttpResponse },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }

    /// The raw body the server sent with a failing status, if it sent one.
    pub fn server_payload(&self) -> Option<&[u8]> {
        match self {
            ApiError::Status { response, .. } if !response.body.is_empty() => {
                Some(&response.body)
            }
            _ => None,
        }
    }

    /// Human-readable message from the server's error envelope.
    ///
    /// Prefers the envelope's `error` field, then `message`, then the body as
    /// text. Returns `None` when the server sent no body.
    pub fn server_message(&self) -> Option<String> {
        let payload = self.server_payload()?;
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(payload) {
            for key in ["error", "message"] {
                if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                    if !message.is_empty() {
                        return Some(message.to_string());
                    }
                }
            }
        }
        Some(String::from_utf8_lossy(payload).into_owned())
    }
}
