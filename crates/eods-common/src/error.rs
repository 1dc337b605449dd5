//! Error types shared by the EODS client crates.

use thiserror::Error;

/// Result type alias using EodsError.
pub type EodsResult<T> = Result<T, EodsError>;

/// Failure raised by an [`HttpBackend`](crate::http::HttpBackend) before a
/// usable reply was obtained.
///
/// Messages are expected to be redacted by the caller that builds them.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server responded with status {status}")]
    Status { status: u16 },

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read TLS certificate bundle: {0}")]
    TlsBundle(String),

    #[error("I/O error while streaming response: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Map a reqwest error onto the transport taxonomy, scrubbing any URL
    /// reqwest attached to it.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let is_timeout = err.is_timeout();
        let is_connect = err.is_connect();
        let status = err.status();
        let message = crate::redact::redact_url_fragments(&err.without_url().to_string());

        if is_timeout {
            TransportError::Timeout(message)
        } else if is_connect {
            TransportError::Connect(message)
        } else if let Some(status) = status {
            TransportError::Status {
                status: status.as_u16(),
            }
        } else {
            TransportError::Request(message)
        }
    }
}

/// Primary error type for operations that do not define their own.
#[derive(Debug, Error)]
pub enum EodsError {
    // === Caller errors ===
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Remote errors ===
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Service responded with status {status} for {url}")]
    ServiceStatus { status: u16, url: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // === Local errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EodsError {
    /// Whether the error was raised before any network call was made.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, EodsError::Validation(_) | EodsError::Config(_))
    }
}
