//! Campground actions.
//!
//! A lot of information about the character can only be found out by
//! requesting the campground: the kitchen, the bartender, the toaster and
//! the arches are all discovered here, whichever action is performed.

use campbot_domain::{CharacterState, Outcome};

use super::{is_unconfirmed, ActionRequest};
use crate::infrastructure::ports::TransportRequest;

pub const CAMPGROUND_ENDPOINT: &str = "campground.php";

fn campground(action: Option<&str>) -> TransportRequest {
    let request = TransportRequest::new(CAMPGROUND_ENDPOINT);
    match action {
        Some(action) => request.with_field("action", action),
        None => request,
    }
}

// Unknown counters pass; the server has the final word
fn require_adventures(character: &CharacterState) -> Result<(), &'static str> {
    if character.adventures_left() == Some(0) {
        Err("no adventures remaining")
    } else {
        Ok(())
    }
}

/// Plain campground visit. Only discovers capabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct CampgroundVisit;

impl ActionRequest for CampgroundVisit {
    fn action_id(&self) -> &'static str {
        "campground"
    }

    fn build(&self) -> TransportRequest {
        campground(None)
    }

    fn failure_message(&self) -> String {
        "Could not load the campground.".to_string()
    }
}

/// Sleep in the tent to restore HP.
#[derive(Debug, Default, Clone, Copy)]
pub struct RestRequest;

impl ActionRequest for RestRequest {
    fn action_id(&self) -> &'static str {
        "rest"
    }

    fn build(&self) -> TransportRequest {
        campground(Some("rest"))
    }

    fn precheck(&self, character: &CharacterState) -> Result<(), &'static str> {
        require_adventures(character)
    }

    fn adventures_per_use(&self) -> u32 {
        1
    }

    fn failure_message(&self) -> String {
        "Could not rest.".to_string()
    }

    fn cancels_sequence_on(&self, outcome: &Outcome) -> bool {
        is_unconfirmed(outcome)
    }
}

/// Relax in the campground to restore MP.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelaxRequest;

impl ActionRequest for RelaxRequest {
    fn action_id(&self) -> &'static str {
        "relax"
    }

    fn build(&self) -> TransportRequest {
        campground(Some("relax"))
    }

    fn precheck(&self, character: &CharacterState) -> Result<(), &'static str> {
        if character.mp().is_some_and(|mp| mp.is_full()) {
            return Err("mp already at maximum");
        }
        require_adventures(character)
    }

    fn adventures_per_use(&self) -> u32 {
        1
    }

    fn failure_message(&self) -> String {
        "Could not relax.".to_string()
    }

    fn cancels_sequence_on(&self, outcome: &Outcome) -> bool {
        is_unconfirmed(outcome)
    }
}

/// Ask the toaster for toast.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToastRequest;

impl ActionRequest for ToastRequest {
    fn action_id(&self) -> &'static str {
        "toast"
    }

    fn build(&self) -> TransportRequest {
        campground(Some("toast"))
    }

    fn failure_message(&self) -> String {
        "The toaster produced nothing.".to_string()
    }

    // An empty toaster and an unrecognized page both stop the sequence
    fn cancels_sequence_on(&self, outcome: &Outcome) -> bool {
        is_unconfirmed(outcome) || matches!(outcome, Outcome::Indeterminate)
    }
}
