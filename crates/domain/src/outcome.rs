//! Classification outcomes.

use std::fmt;

use crate::delta::StateDelta;

/// Why an action did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Non-200 status, connection failure or timeout
    TransportError,
    /// Local resource state disallowed the action; nothing was sent
    PreconditionNotMet,
    /// The sticky cancellation flag rejected the dispatch
    SessionCancelled,
    /// 200 status, but the expected confirmation text was absent or a
    /// refusal phrase was present
    ClassificationFailure(String),
}

impl FailureReason {
    pub fn classification(reason: impl Into<String>) -> Self {
        Self::ClassificationFailure(reason.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::TransportError => "transport-error",
            Self::PreconditionNotMet => "precondition-not-met",
            Self::SessionCancelled => "session-cancelled",
            Self::ClassificationFailure(reason) => reason,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one response.
///
/// `Indeterminate` marks text that neither confirms nor refuses the action.
/// Callers treat it exactly like a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { deltas: StateDelta },
    Failure { reason: FailureReason },
    Indeterminate,
}

impl Outcome {
    pub fn success(deltas: StateDelta) -> Self {
        Self::Success { deltas }
    }

    pub fn failure(reason: FailureReason) -> Self {
        Self::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// True for both `Failure` and `Indeterminate`.
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Failure { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn deltas(&self) -> Option<&StateDelta> {
        match self {
            Self::Success { deltas } => Some(deltas),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { .. } => write!(f, "success"),
            Self::Failure { reason } => write!(f, "failure ({})", reason),
            Self::Indeterminate => write!(f, "indeterminate"),
        }
    }
}
