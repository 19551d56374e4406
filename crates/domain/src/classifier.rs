//! Response classifier.
//!
//! Maps `(action, status, text)` to an [`Outcome`]. Classification is pure:
//! the same inputs always produce the same outcome, and nothing here reads
//! or writes character state.
//!
//! Order of evaluation:
//! 1. Any status other than 200 is a transport failure. The body is ignored.
//! 2. Capability markers and explicit removal phrases are collected. This
//!    runs for every action.
//! 3. Resource changes are scraped from the results section.
//! 4. The action's [`ConfirmationRule`], if any, decides success. Actions
//!    without a rule succeed by default.

use crate::capability::{Capability, CapabilitySet};
use crate::outcome::{FailureReason, Outcome};
use crate::probes::{
    confirmation_rule, ConfirmationRule, CAPABILITY_MARKERS, CAPABILITY_REMOVED_PHRASES,
};
use crate::results::scrape_results;

pub const HTTP_OK: u16 = 200;

/// Capabilities a page proves present and those it explicitly reports lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityScan {
    pub found: CapabilitySet,
    pub removed: Vec<Capability>,
}

/// Scan a page for capability markers.
///
/// Absence of a marker never produces a removal; only the phrases in
/// [`CAPABILITY_REMOVED_PHRASES`] do.
pub fn scan_capabilities(raw: &str) -> CapabilityScan {
    let found = CAPABILITY_MARKERS
        .iter()
        .filter(|(_, marker)| raw.contains(marker))
        .map(|(capability, _)| *capability)
        .collect();

    let removed = CAPABILITY_REMOVED_PHRASES
        .iter()
        .filter(|(_, phrase)| raw.contains(phrase))
        .map(|(capability, _)| *capability)
        .collect();

    CapabilityScan { found, removed }
}

/// Classify one response for the given action identifier.
pub fn classify(action: &str, status: u16, raw: &str) -> Outcome {
    if status != HTTP_OK {
        return Outcome::failure(FailureReason::TransportError);
    }

    let scan = scan_capabilities(raw);
    let mut deltas = scrape_results(raw).with_capabilities(scan.found);
    deltas.capabilities_removed = scan.removed;

    match confirmation_rule(action) {
        None => Outcome::success(deltas),
        Some(rule) => match judge(rule, raw) {
            Judgment::Confirmed => Outcome::success(deltas),
            Judgment::Refused => {
                Outcome::failure(FailureReason::classification(rule.failure_reason))
            }
            Judgment::Unrecognized if rule.unrecognized_is_indeterminate => {
                Outcome::Indeterminate
            }
            Judgment::Unrecognized => {
                Outcome::failure(FailureReason::classification(rule.failure_reason))
            }
        },
    }
}

enum Judgment {
    Confirmed,
    Refused,
    Unrecognized,
}

fn judge(rule: &ConfirmationRule, raw: &str) -> Judgment {
    if raw.contains(rule.confirmation) {
        Judgment::Confirmed
    } else if rule.refusals.iter().any(|refusal| raw.contains(refusal)) {
        Judgment::Refused
    } else {
        Judgment::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::ItemGain;

    const CAMPGROUND_PAGE: &str = r#"<html><body>
        <a href="cook.php">Cook</a>
        <a href="campground.php?action=toast">Toaster</a>
        <b>Your Campsite</b>
        </body></html>"#;

    #[test]
    fn non_200_is_transport_error_regardless_of_body() {
        for status in [0, 302, 404, 500, 503] {
            let outcome = classify("rest", status, "You sleep. cook.php");
            assert_eq!(outcome, Outcome::failure(FailureReason::TransportError));
        }
    }

    #[test]
    fn rest_with_sleep_phrase_succeeds_and_discovers_kitchen() {
        let outcome = classify("rest", 200, "cook.php ... You sleep soundly.");
        let deltas = outcome.deltas().expect("rest should succeed");
        assert!(deltas.capabilities_found.has(Capability::CookingFacility));
        assert!(!deltas.capabilities_found.has(Capability::BarFacility));
    }

    #[test]
    fn missing_confirmation_fails_for_every_probed_action() {
        for action in ["rest", "relax", "toast"] {
            let outcome = classify(action, 200, CAMPGROUND_PAGE);
            assert!(outcome.is_failure(), "{action} should not succeed");
        }
    }

    #[test]
    fn rest_without_phrase_reports_reason() {
        let outcome = classify("rest", 200, "You can't sleep right now.");
        assert_eq!(
            outcome.failure_reason(),
            Some(&FailureReason::classification("rest-not-confirmed"))
        );
    }

    #[test]
    fn relax_requires_relax_phrase() {
        assert!(classify("relax", 200, "You relax in your chair.").is_success());
        assert!(classify("relax", 200, "You sleep.").is_failure());
    }

    #[test]
    fn toast_acquire_succeeds_with_item() {
        let raw = "You acquire an item: <b>toast</b><hr>Your Campsite";
        let deltas = classify("toast", 200, raw).deltas().cloned().unwrap();
        assert_eq!(deltas.items, vec![ItemGain::new("toast", 1)]);
    }

    #[test]
    fn toast_refusal_is_failure_and_silence_is_indeterminate() {
        let refused = classify("toast", 200, "Your toaster doesn't feel like toasting anything.");
        assert_eq!(
            refused.failure_reason(),
            Some(&FailureReason::classification("toast-refused"))
        );

        assert_eq!(classify("toast", 200, CAMPGROUND_PAGE), Outcome::Indeterminate);
    }

    #[test]
    fn unknown_action_defaults_to_success() {
        let outcome = classify("campground", 200, CAMPGROUND_PAGE);
        let deltas = outcome.deltas().unwrap();
        assert!(deltas.capabilities_found.has(Capability::Toaster));
        assert!(deltas.capabilities_found.has(Capability::CookingFacility));

        assert!(classify("no-such-action", 200, "").is_success());
    }

    #[test]
    fn absence_of_marker_never_removes() {
        let scan = scan_capabilities("<html>empty</html>");
        assert!(scan.found.is_empty());
        assert!(scan.removed.is_empty());

        let scan = scan_capabilities("Your toaster breaks into pieces.");
        assert_eq!(scan.removed, vec![Capability::Toaster]);
    }

    #[test]
    fn classification_is_repeatable() {
        let first = classify("rest", 200, "You sleep. You gain 10 hit points.");
        let second = classify("rest", 200, "You sleep. You gain 10 hit points.");
        assert_eq!(first, second);
    }
}
