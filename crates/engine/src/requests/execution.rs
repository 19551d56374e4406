//! Single-use lifecycle of one action request.
//!
//! ```text
//! Created -> PrecheckFailed
//! Created -> Dispatched -> TransportError
//! Created -> Dispatched -> Classified -> AppliedSuccess
//! Created -> Dispatched -> Classified -> AppliedFailure
//! ```
//!
//! Terminal phases accept no further transitions. An attempted illegal
//! transition is a programming error and fails only the current request.

use std::fmt;

use campbot_domain::{CharacterState, FailureReason, Outcome};

use super::ActionRequest;
use crate::infrastructure::ports::{TransportPort, TransportRequest};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Created,
    PrecheckFailed,
    Dispatched,
    TransportError,
    Classified,
    AppliedSuccess,
    AppliedFailure,
}

impl RequestPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::PrecheckFailed | Self::TransportError | Self::AppliedSuccess | Self::AppliedFailure
        )
    }

    fn can_transition_to(self, next: RequestPhase) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::PrecheckFailed)
                | (Self::Created, Self::Dispatched)
                | (Self::Dispatched, Self::TransportError)
                | (Self::Dispatched, Self::Classified)
                | (Self::Classified, Self::AppliedSuccess)
                | (Self::Classified, Self::AppliedFailure)
        )
    }
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::PrecheckFailed => "precheck-failed",
            Self::Dispatched => "dispatched",
            Self::TransportError => "transport-error",
            Self::Classified => "classified",
            Self::AppliedSuccess => "applied-success",
            Self::AppliedFailure => "applied-failure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid transition for {action}: {from} -> {to}")]
    InvalidTransition {
        action: &'static str,
        from: RequestPhase,
        to: RequestPhase,
    },
}

/// What applying an outcome asks of the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOutcome {
    /// Adventures charged for this request
    pub adventures_used: u32,
    /// Diagnostic to send to the display, for failures
    pub diagnostic: Option<String>,
    /// Whether the rest of the running sequence must be cancelled
    pub cancel_sequence: bool,
}

/// A request plus everything learned while running it.
#[derive(Debug)]
pub struct ActionExecution {
    request: Box<dyn ActionRequest>,
    phase: RequestPhase,
    sent: Option<TransportRequest>,
    status: Option<u16>,
    response_text: Option<String>,
    rejection: Option<&'static str>,
    error: bool,
}

impl ActionExecution {
    pub fn new(request: Box<dyn ActionRequest>) -> Self {
        Self {
            request,
            phase: RequestPhase::Created,
            sent: None,
            status: None,
            response_text: None,
            rejection: None,
            error: false,
        }
    }

    pub fn action_id(&self) -> &'static str {
        self.request.action_id()
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn is_error_state(&self) -> bool {
        self.error
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn response_text(&self) -> Option<&str> {
        self.response_text.as_deref()
    }

    /// Why the precondition rejected the request, if it did.
    pub fn rejection_reason(&self) -> Option<&'static str> {
        self.rejection
    }

    /// The submission that went over the wire, once dispatched.
    pub fn sent_request(&self) -> Option<&TransportRequest> {
        self.sent.as_ref()
    }

    pub fn request(&self) -> &dyn ActionRequest {
        self.request.as_ref()
    }

    fn transition(&mut self, next: RequestPhase) -> Result<(), RequestError> {
        if !self.phase.can_transition_to(next) {
            return Err(RequestError::InvalidTransition {
                action: self.action_id(),
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Run the local precondition. Returns the rejection outcome when it fails.
    pub fn check_precondition(
        &mut self,
        character: &CharacterState,
    ) -> Result<Option<Outcome>, RequestError> {
        if self.phase != RequestPhase::Created {
            return Err(RequestError::InvalidTransition {
                action: self.action_id(),
                from: self.phase,
                to: RequestPhase::Dispatched,
            });
        }

        match self.request.precheck(character) {
            Ok(()) => Ok(None),
            Err(why) => {
                self.transition(RequestPhase::PrecheckFailed)?;
                self.error = true;
                self.rejection = Some(why);
                tracing::info!(action = self.action_id(), reason = why, "Precondition not met");
                Ok(Some(Outcome::failure(FailureReason::PreconditionNotMet)))
            }
        }
    }

    /// Perform the single transport round trip and classify the response.
    pub async fn execute(&mut self, transport: &dyn TransportPort) -> Result<Outcome, RequestError> {
        self.transition(RequestPhase::Dispatched)?;

        let outbound = self.request.build();
        let result = transport.send(&outbound).await;
        self.sent = Some(outbound);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(action = self.action_id(), error = %e, "Transport failure");
                self.transition(RequestPhase::TransportError)?;
                self.error = true;
                return Ok(Outcome::failure(FailureReason::TransportError));
            }
        };

        let outcome = self.request.classify(response.status, &response.body);
        self.status = Some(response.status);
        self.response_text = Some(response.body);

        if outcome.failure_reason() == Some(&FailureReason::TransportError) {
            tracing::warn!(action = self.action_id(), status = response.status, "Unexpected status");
            self.transition(RequestPhase::TransportError)?;
            self.error = true;
        } else {
            self.transition(RequestPhase::Classified)?;
        }

        Ok(outcome)
    }

    /// Merge a classified outcome into the character.
    ///
    /// On success the deltas are applied and the adventure cost is charged.
    /// On failure the character is left untouched and the error flag set.
    pub fn apply_outcome(
        &mut self,
        outcome: &Outcome,
        character: &mut CharacterState,
    ) -> Result<AppliedOutcome, RequestError> {
        match outcome {
            Outcome::Success { deltas } => {
                self.transition(RequestPhase::AppliedSuccess)?;
                character.apply(deltas);
                let adventures_used = self.cost_in_adventures();
                character.spend_adventures(adventures_used);
                Ok(AppliedOutcome {
                    adventures_used,
                    diagnostic: None,
                    cancel_sequence: false,
                })
            }
            // Capability markers on a failed page are dropped with the rest
            // of the delta; the next successful page reports them again.
            Outcome::Failure { .. } | Outcome::Indeterminate => {
                self.transition(RequestPhase::AppliedFailure)?;
                self.error = true;
                Ok(AppliedOutcome {
                    adventures_used: 0,
                    diagnostic: Some(self.request.failure_message()),
                    cancel_sequence: self.request.cancels_sequence_on(outcome),
                })
            }
        }
    }

    /// Adventures this request consumed: zero once it has errored.
    pub fn cost_in_adventures(&self) -> u32 {
        if self.error {
            0
        } else {
            self.request.adventures_per_use()
        }
    }
}
