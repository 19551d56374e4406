//! Capability flags discovered by scraping campground pages.
//!
//! Flags are monotonic for a session: [`CapabilitySet::observe`] only ever
//! turns a flag on, and [`CapabilitySet::remove`] is reserved for an explicit
//! "facility removed" signal parsed from a response.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A discovered feature of the player's session environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// A chef (or oven) makes `cook.php` available
    CookingFacility,
    /// A bartender makes `cocktail.php` available
    BarFacility,
    /// The campground has a toaster
    Toaster,
    /// The campground has golden arches
    Arches,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::CookingFacility,
        Capability::BarFacility,
        Capability::Toaster,
        Capability::Arches,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CookingFacility => "has-cooking-facility",
            Self::BarFacility => "has-bar-facility",
            Self::Toaster => "has-toaster",
            Self::Arches => "has-arches",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s.trim())
            .ok_or_else(|| DomainError::parse(format!("Unknown capability: {}", s)))
    }
}

/// The set of capabilities known to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    present: BTreeSet<Capability>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.present.contains(&capability)
    }

    /// Record that a capability was observed. Returns true if it was newly learned.
    pub fn observe(&mut self, capability: Capability) -> bool {
        self.present.insert(capability)
    }

    /// Clear a capability after an explicit removal signal.
    pub fn remove(&mut self, capability: Capability) -> bool {
        self.present.remove(&capability)
    }

    /// Monotonic OR of another set into this one.
    pub fn merge(&mut self, other: &CapabilitySet) {
        self.present.extend(other.present.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.present.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self {
            present: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_reports_only_new_flags() {
        let mut set = CapabilitySet::new();
        assert!(set.observe(Capability::Toaster));
        assert!(!set.observe(Capability::Toaster));
        assert!(set.has(Capability::Toaster));
    }

    #[test]
    fn merge_never_clears_existing_flags() {
        let mut set: CapabilitySet = [Capability::Arches].into_iter().collect();
        set.merge(&CapabilitySet::new());
        assert!(set.has(Capability::Arches));

        set.merge(&[Capability::BarFacility].into_iter().collect());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn capability_names_round_trip_through_from_str() {
        for cap in Capability::ALL {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
        assert!("has-pool".parse::<Capability>().is_err());
    }
}
