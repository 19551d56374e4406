//! External collaborator ports: the game server and the display.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use campbot_domain::DomainError;
use serde::{Deserialize, Serialize};

use super::error::TransportError;

// =============================================================================
// Transport
// =============================================================================

/// Ordered form fields. Order is part of the request and is preserved
/// through recording and replay.
pub type FormParams = Vec<(String, String)>;

/// One outbound form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportRequest {
    /// Path relative to the server root, e.g. `campground.php`
    pub endpoint: String,
    pub params: FormParams,
}

impl TransportRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// Form-encoded request in, text response out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Perform exactly one round trip.
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

// =============================================================================
// Display notifications
// =============================================================================

/// How the display should present a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayState {
    Normal,
    Error,
    Disabled,
    NoChange,
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Error => write!(f, "error"),
            Self::Disabled => write!(f, "disabled"),
            Self::NoChange => write!(f, "no-change"),
        }
    }
}

impl FromStr for DisplayState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "error" => Ok(Self::Error),
            "disabled" => Ok(Self::Disabled),
            "no-change" => Ok(Self::NoChange),
            _ => Err(DomainError::parse(format!("Unknown display state: {}", s))),
        }
    }
}

/// Fire-and-forget sink for status messages.
///
/// Implementations must not block and must not panic back into the caller.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationPort: Send + Sync {
    fn notify(&self, state: DisplayState, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_state_names_round_trip() {
        for state in [
            DisplayState::Normal,
            DisplayState::Error,
            DisplayState::Disabled,
            DisplayState::NoChange,
        ] {
            assert_eq!(state.to_string().parse::<DisplayState>().unwrap(), state);
        }
        assert!("blinking".parse::<DisplayState>().is_err());
    }

    #[test]
    fn field_lookup_keeps_first_match() {
        let request = TransportRequest::new("campground.php")
            .with_field("action", "rest")
            .with_field("action", "relax");
        assert_eq!(request.field("action"), Some("rest"));
        assert_eq!(request.field("pwd"), None);
    }
}
