//! Literal probes matched against campground responses.
//!
//! The remote service has no schema: every judgment the classifier makes
//! comes from one of the strings or patterns below. Keep them all here so a
//! change in the game's wording is a one-file edit.

use crate::capability::Capability;

/// Text after this marker is page chrome; result scraping stops here.
pub const CAMPSITE_MARKER: &str = "Your Campsite";

/// Substrings whose presence proves a capability exists.
pub const CAPABILITY_MARKERS: [(Capability, &str); 4] = [
    (Capability::CookingFacility, "cook.php"),
    (Capability::BarFacility, "cocktail.php"),
    (Capability::Toaster, "action=toast"),
    (Capability::Arches, "action=arches"),
];

/// Phrases that explicitly signal a facility was lost.
pub const CAPABILITY_REMOVED_PHRASES: [(Capability, &str); 3] = [
    (Capability::CookingFacility, "Your chef explodes"),
    (Capability::BarFacility, "Your bartender explodes"),
    (Capability::Toaster, "Your toaster breaks"),
];

pub const REST_CONFIRMATION: &str = "You sleep";
pub const RELAX_CONFIRMATION: &str = "You relax";
pub const TOAST_ACQUIRE: &str = "acquire";

/// Known ways the toaster says no.
pub const TOAST_REFUSALS: &[&str] = &[
    "You don't have a toaster",
    "toaster doesn't feel like toasting",
];

/// How one action's response proves success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationRule {
    /// Action identifier the rule applies to
    pub action: &'static str,
    /// Substring that must be present for success
    pub confirmation: &'static str,
    /// Substrings that prove a controlled refusal
    pub refusals: &'static [&'static str],
    /// Reason reported when the action failed
    pub failure_reason: &'static str,
    /// Whether text with neither confirmation nor refusal is `Indeterminate`
    /// rather than a plain failure
    pub unrecognized_is_indeterminate: bool,
}

/// One row per action with a success probe. Actions without a row
/// (plain visits and no-ops) succeed whenever transport succeeds.
pub const CONFIRMATION_RULES: &[ConfirmationRule] = &[
    ConfirmationRule {
        action: "rest",
        confirmation: REST_CONFIRMATION,
        refusals: &[],
        failure_reason: "rest-not-confirmed",
        unrecognized_is_indeterminate: false,
    },
    ConfirmationRule {
        action: "relax",
        confirmation: RELAX_CONFIRMATION,
        refusals: &[],
        failure_reason: "relax-not-confirmed",
        unrecognized_is_indeterminate: false,
    },
    ConfirmationRule {
        action: "toast",
        confirmation: TOAST_ACQUIRE,
        refusals: TOAST_REFUSALS,
        failure_reason: "toast-refused",
        unrecognized_is_indeterminate: true,
    },
];

pub fn confirmation_rule(action: &str) -> Option<&'static ConfirmationRule> {
    CONFIRMATION_RULES.iter().find(|rule| rule.action == action)
}

// Result patterns (regex-lite syntax). Numbers may carry thousands separators.

pub const MEAT_GAIN_PATTERN: &str = r"You gain ([\d,]+) Meat";
pub const MEAT_LOSS_PATTERN: &str = r"You (?:lose|spent) ([\d,]+) Meat";
pub const HP_GAIN_PATTERN: &str = r"(?i)You gain ([\d,]+) hit points?";
pub const HP_LOSS_PATTERN: &str = r"(?i)You lose ([\d,]+) hit points?";
pub const MP_GAIN_PATTERN: &str = r"(?i)You gain ([\d,]+) (?:mana|mojo|mysticality) points?";
pub const SINGLE_ITEM_PATTERN: &str = r"You acquire an item: <b>([^<]+)</b>";
pub const MULTI_ITEM_PATTERN: &str = r"You acquire <b>([^<]+?) \(([\d,]+)\)</b>";
