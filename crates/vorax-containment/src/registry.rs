//! Per-capturer containment registry
//!
//! Ordered held list with unique membership, recently-released cooldowns,
//! the capturer's enzyme levels, and the toxin damage interval accumulator.
//! Cleared wholesale when the capturer dies.

use std::collections::HashMap;

use vorax_core::{EnzymeLevels, OrganismId};

use crate::{CapacityLedger, CAPACITY_EPSILON};

#[derive(Debug, Clone)]
pub struct Containment {
    ledger: CapacityLedger,
    /// Insertion order is preserved; an object appears at most once
    held: Vec<OrganismId>,
    /// Cooldown timer per recently-ejected object, blocking instant
    /// re-capture by this capturer
    recently_released: HashMap<OrganismId, f32>,
    enzymes: EnzymeLevels,
    toxin_timer: f32,
    toxin_taken: f32,
}

impl Containment {
    pub fn new(capacity: f32, enzymes: EnzymeLevels) -> Self {
        Containment {
            ledger: CapacityLedger::new(capacity),
            held: Vec::new(),
            recently_released: HashMap::new(),
            enzymes,
            toxin_timer: 0.0,
            toxin_taken: 0.0,
        }
    }

    #[inline]
    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    #[inline]
    pub fn ledger_mut(&mut self) -> &mut CapacityLedger {
        &mut self.ledger
    }

    #[inline]
    pub fn held(&self) -> &[OrganismId] {
        &self.held
    }

    #[inline]
    pub fn is_holding(&self, object: OrganismId) -> bool {
        self.held.contains(&object)
    }

    #[inline]
    pub fn enzymes(&self) -> &EnzymeLevels {
        &self.enzymes
    }

    #[inline]
    pub fn enzymes_mut(&mut self) -> &mut EnzymeLevels {
        &mut self.enzymes
    }

    /// Admit an object of `size`. Refuses duplicates and admissions that
    /// would overflow capacity; on refusal nothing is committed.
    pub fn admit(&mut self, object: OrganismId, size: f32) -> bool {
        if self.is_holding(object) {
            return false;
        }
        if !self.ledger.admit(size) {
            return false;
        }
        self.held.push(object);
        true
    }

    /// Remove an object and credit back its adjusted size.
    /// Returns false when the object was not in the held list.
    pub fn remove(&mut self, object: OrganismId, adjusted_size: f32) -> bool {
        let Some(pos) = self.held.iter().position(|&h| h == object) else {
            return false;
        };
        self.held.remove(pos);
        let _ = self.ledger.release(adjusted_size);
        true
    }

    /// Drop an object from the held list without touching the ledger.
    /// Used by orphan repair, where the next settle pass fixes the sum.
    pub fn forget(&mut self, object: OrganismId) -> bool {
        let Some(pos) = self.held.iter().position(|&h| h == object) else {
            return false;
        };
        self.held.remove(pos);
        true
    }

    /// Record a just-ejected object so it cannot be re-captured by this
    /// capturer until the cooldown expires.
    pub fn note_released(&mut self, object: OrganismId, cooldown: f32) {
        if cooldown > 0.0 {
            self.recently_released.insert(object, cooldown);
        }
    }

    #[inline]
    pub fn cooldown_remaining(&self, object: OrganismId) -> f32 {
        self.recently_released.get(&object).copied().unwrap_or(0.0)
    }

    /// Advance cooldown timers, dropping expired entries.
    pub fn tick_cooldowns(&mut self, delta: f32) {
        self.recently_released.retain(|_, t| {
            *t -= delta;
            *t > 0.0
        });
    }

    /// Accumulate toxin taken this tick for the fixed-interval damage rule.
    pub fn record_toxin(&mut self, amount: f32) {
        self.toxin_taken += amount.max(0.0);
    }

    /// Advance the toxin check timer. When the fixed interval elapses and
    /// any toxin was taken since the last check, returns the accumulated
    /// amount and resets. Frame-rate independent by construction.
    pub fn toxin_check(&mut self, interval: f32, delta: f32) -> Option<f32> {
        self.toxin_timer += delta;
        if self.toxin_timer < interval {
            return None;
        }
        self.toxin_timer -= interval;
        if self.toxin_taken <= CAPACITY_EPSILON {
            self.toxin_taken = 0.0;
            return None;
        }
        Some(std::mem::take(&mut self.toxin_taken))
    }

    /// Forced teardown on capturer death: returns the held list and resets
    /// every piece of containment state.
    pub fn clear(&mut self) -> Vec<OrganismId> {
        self.ledger.settle(0.0);
        self.recently_released.clear();
        self.toxin_timer = 0.0;
        self.toxin_taken = 0.0;
        std::mem::take(&mut self.held)
    }
}
