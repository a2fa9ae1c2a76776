//! Errors surfaced by an `ExportGateway` implementation.

use thiserror::Error;

/// Failure of a remote call made on behalf of the export workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The remote API answered with a non-2xx status.
    ///
    /// `body` is the raw response text, read before this error was built.
    #[error("{status} {reason} for url: {url}")]
    Http {
        status: u16,
        reason: String,
        url: String,
        body: Option<String>,
    },

    /// The request never produced an HTTP response (connect, timeout, TLS, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx response whose body could not be decoded.
    #[error("Invalid response from MDM API: {0}")]
    Decode(String),

    /// Writing a downloaded payload to disk failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl GatewayError {
    /// HTTP status code of the remote response, if there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw body returned by the remote system, if one was captured.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            GatewayError::Http { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// Whether repeating the same idempotent call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::Http { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(err.to_string())
    }
}
