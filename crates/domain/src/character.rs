//! Session-scoped record of a player's resources and discovered capabilities.
//!
//! # Invariants
//!
//! - `0 <= current <= max` for both HP and MP
//! - `adventures_left` never goes negative (clamped at zero)
//! - HP, MP and adventures are `None` until a login value or a status
//!   refresh reports them; prechecks never reject on an unknown counter
//! - capability flags are only cleared by an explicit removal signal
//!
//! The record is owned by the session controller. Everything else sees
//! cloned snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability::{Capability, CapabilitySet};
use crate::delta::StateDelta;

/// A bounded resource such as hit points or mana points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    current: u32,
    maximum: u32,
}

impl Gauge {
    /// Create a gauge, clamping `current` into `0..=maximum`.
    pub fn new(current: u32, maximum: u32) -> Self {
        Self {
            current: current.min(maximum),
            maximum,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.maximum
    }

    /// Shift the current value by `amount`, clamped to the gauge bounds.
    pub fn adjust(&mut self, amount: i32) {
        let next = i64::from(self.current) + i64::from(amount);
        self.current = next.clamp(0, i64::from(self.maximum)) as u32;
    }

    /// Change the maximum, pulling `current` down if it no longer fits.
    pub fn set_maximum(&mut self, maximum: u32) {
        self.maximum = maximum;
        self.current = self.current.min(maximum);
    }

}

/// The live character record for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    name: String,
    hp: Option<Gauge>,
    mp: Option<Gauge>,
    meat: u64,
    closet_meat: u64,
    adventures_left: Option<u32>,
    inebriety: u32,
    capabilities: CapabilitySet,
    inventory: BTreeMap<String, u32>,
}

impl CharacterState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // Builder-style setters used at login and by listener-driven refreshes

    pub fn with_hp(mut self, current: u32, maximum: u32) -> Self {
        self.hp = Some(Gauge::new(current, maximum));
        self
    }

    pub fn with_mp(mut self, current: u32, maximum: u32) -> Self {
        self.mp = Some(Gauge::new(current, maximum));
        self
    }

    pub fn with_meat(mut self, meat: u64) -> Self {
        self.meat = meat;
        self
    }

    pub fn with_adventures(mut self, adventures: u32) -> Self {
        self.adventures_left = Some(adventures);
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.observe(capability);
        self
    }

    // Read accessors

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` until HP has been reported.
    pub fn hp(&self) -> Option<Gauge> {
        self.hp
    }

    /// `None` until MP has been reported.
    pub fn mp(&self) -> Option<Gauge> {
        self.mp
    }

    pub fn meat(&self) -> u64 {
        self.meat
    }

    pub fn closet_meat(&self) -> u64 {
        self.closet_meat
    }

    /// `None` until the adventure counter has been reported.
    pub fn adventures_left(&self) -> Option<u32> {
        self.adventures_left
    }

    pub fn inebriety(&self) -> u32 {
        self.inebriety
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    pub fn inventory(&self) -> &BTreeMap<String, u32> {
        &self.inventory
    }

    pub fn item_count(&self, name: &str) -> u32 {
        self.inventory.get(name).copied().unwrap_or(0)
    }

    // Mutation

    pub fn set_hp(&mut self, current: u32, maximum: u32) {
        self.hp = Some(Gauge::new(current, maximum));
    }

    pub fn set_mp(&mut self, current: u32, maximum: u32) {
        self.mp = Some(Gauge::new(current, maximum));
    }

    pub fn set_meat(&mut self, meat: u64, closet_meat: u64) {
        self.meat = meat;
        self.closet_meat = closet_meat;
    }

    pub fn set_adventures(&mut self, adventures: u32) {
        self.adventures_left = Some(adventures);
    }

    pub fn set_inebriety(&mut self, inebriety: u32) {
        self.inebriety = inebriety;
    }

    /// Subtract spent adventures, never dropping below zero.
    ///
    /// An unknown counter stays unknown.
    pub fn spend_adventures(&mut self, adventures: u32) {
        if let Some(left) = &mut self.adventures_left {
            *left = left.saturating_sub(adventures);
        }
    }

    /// Merge a classified delta into the record.
    ///
    /// Capabilities are OR-ed in, then explicit removals are applied. Meat
    /// loss saturates at zero and gauges stay within their bounds.
    pub fn apply(&mut self, delta: &StateDelta) {
        self.capabilities.merge(&delta.capabilities_found);
        for capability in &delta.capabilities_removed {
            self.capabilities.remove(*capability);
        }

        if let Some(hp) = &mut self.hp {
            hp.adjust(delta.hp);
        }
        if let Some(mp) = &mut self.mp {
            mp.adjust(delta.mp);
        }

        if delta.meat >= 0 {
            self.meat = self.meat.saturating_add(delta.meat.unsigned_abs());
        } else {
            self.meat = self.meat.saturating_sub(delta.meat.unsigned_abs());
        }

        for item in &delta.items {
            let count = self.inventory.entry(item.name.clone()).or_insert(0);
            *count = count.saturating_add(item.quantity);
        }
    }
}
