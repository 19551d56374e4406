//! Action requests.
//!
//! Each game action is one type implementing [`ActionRequest`]. A request
//! knows how to build its form submission, which local precondition it has,
//! how many adventures it consumes and when a failure must stop the rest of
//! a sequence. Adding an action means adding a type and a row in
//! [`registry`]; nothing that dispatches requests needs to change.

pub mod campground;
pub mod execution;
pub mod registry;

use std::fmt;

use campbot_domain::{classify, CharacterState, FailureReason, Outcome};

use crate::infrastructure::ports::TransportRequest;

pub use campground::{CampgroundVisit, RelaxRequest, RestRequest, ToastRequest};
pub use execution::{ActionExecution, AppliedOutcome, RequestError, RequestPhase};
pub use registry::{ActionSpec, ACTIONS};

/// One kind of game action.
pub trait ActionRequest: Send + Sync + fmt::Debug {
    /// Identifier the action is registered and recorded under.
    fn action_id(&self) -> &'static str;

    /// Produce the outbound form submission. Pure.
    fn build(&self) -> TransportRequest;

    /// Check local resource state before anything is sent.
    ///
    /// `Err` carries a short explanation for the log; the request then ends
    /// as `PreconditionNotMet` without a transport call.
    fn precheck(&self, _character: &CharacterState) -> Result<(), &'static str> {
        Ok(())
    }

    /// Interpret a response. Defaults to the shared classifier.
    fn classify(&self, status: u16, body: &str) -> Outcome {
        classify(self.action_id(), status, body)
    }

    /// Adventures consumed by one successful use. Zero for free actions.
    fn adventures_per_use(&self) -> u32 {
        0
    }

    /// Fixed one-line diagnostic shown when the action fails.
    fn failure_message(&self) -> String {
        format!("Could not {}.", self.action_id())
    }

    /// Whether this outcome must cancel the rest of the running sequence.
    fn cancels_sequence_on(&self, _outcome: &Outcome) -> bool {
        false
    }
}

/// True when the server answered but did not confirm the action.
pub(crate) fn is_unconfirmed(outcome: &Outcome) -> bool {
    matches!(
        outcome,
        Outcome::Failure {
            reason: FailureReason::ClassificationFailure(_)
        }
    )
}
