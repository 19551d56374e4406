//! State deltas produced by a successful classification.

use serde::{Deserialize, Serialize};

use crate::capability::{Capability, CapabilitySet};

/// Items acquired in a single response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGain {
    pub name: String,
    pub quantity: u32,
}

impl ItemGain {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Changes to apply to a [`CharacterState`](crate::CharacterState).
///
/// Every numeric field defaults to zero, meaning "no change". Capability
/// observations are merged with a monotonic OR; `capabilities_removed` is
/// only populated by an explicit removal phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    pub capabilities_found: CapabilitySet,
    pub capabilities_removed: Vec<Capability>,
    pub hp: i32,
    pub mp: i32,
    pub meat: i64,
    pub items: Vec<ItemGain>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capabilities(mut self, found: CapabilitySet) -> Self {
        self.capabilities_found = found;
        self
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    pub fn with_mp(mut self, mp: i32) -> Self {
        self.mp = mp;
        self
    }

    pub fn with_meat(mut self, meat: i64) -> Self {
        self.meat = meat;
        self
    }

    pub fn with_item(mut self, item: ItemGain) -> Self {
        self.items.push(item);
        self
    }

    /// True when applying this delta changes nothing.
    pub fn is_empty(&self) -> bool {
        self.capabilities_found.is_empty()
            && self.capabilities_removed.is_empty()
            && self.hp == 0
            && self.mp == 0
            && self.meat == 0
            && self.items.is_empty()
    }
}
