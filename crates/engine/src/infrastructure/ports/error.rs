//! Error types for port operations.

/// Transport round-trip errors.
///
/// The classifier layer does not distinguish between these: every variant
/// becomes `FailureReason::TransportError`. They are kept apart for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be made or the request was rejected locally.
    #[error("Request to {endpoint} failed: {message}")]
    RequestFailed { endpoint: String, message: String },

    /// The per-request timeout elapsed.
    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// The response body could not be read as text.
    #[error("Unreadable response body from {endpoint}: {message}")]
    Body { endpoint: String, message: String },
}

impl TransportError {
    pub fn request_failed(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::RequestFailed {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn timeout(endpoint: impl Into<String>) -> Self {
        Self::Timeout {
            endpoint: endpoint.into(),
        }
    }

    pub fn body(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Body {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
