//! Organism model
//!
//! An organism optionally carries the capturer capability ([`Containment`])
//! and the held-object capability ([`Containable`]). Both are relations
//! over [`OrganismId`] handles, never ownership edges.

use std::collections::HashMap;

use vorax_core::{
    Compound, CompoundBag, CompoundStore, Enzyme, OrganismId, Phase, SpeciesId,
};

use crate::Containment;

/// Held-object state: phase, digestion progress, and the captor relation.
#[derive(Debug, Clone, Default)]
pub struct Containable {
    pub phase: Phase,
    /// Proportion of the original digestible material already extracted.
    /// Monotonically non-decreasing across the object's lifetime.
    pub digested_fraction: f32,
    /// Snapshot of total digestible material taken at capture time. Used
    /// as the divisor for fraction-remaining; never recomputed mid-hold.
    pub initial_total: f32,
    /// Capability required to digest this object; `None` means the default
    /// capability suffices
    pub requisite_enzyme: Option<Enzyme>,
    /// Extra digestible material not visible in the normal store
    pub hidden_reserves: Option<HashMap<Compound, f32>>,
    /// Weak relation to the current capturer; `None` iff phase is `None`
    pub captor: Option<OrganismId>,
    /// One-shot guard for the cross-session species tally offer
    pub tally_offered: bool,
    /// One-shot guard for the missing-capability notice
    pub capability_notified: bool,
    /// One-shot guard for the zero-baseline data-setup error log
    pub baseline_fault_logged: bool,
}

impl Containable {
    pub fn new() -> Self {
        Containable::default()
    }

    pub fn requiring(enzyme: Enzyme) -> Self {
        Containable {
            requisite_enzyme: Some(enzyme),
            ..Containable::default()
        }
    }

    pub fn with_hidden_reserves(mut self, reserves: &[(Compound, f32)]) -> Self {
        self.hidden_reserves = Some(reserves.iter().copied().collect());
        self
    }

    /// Advance to a later (or equal) phase. A backwards transition outside
    /// the forced-reset paths is a scheduling bug.
    pub fn advance(&mut self, to: Phase) {
        debug_assert!(
            to.rank() >= self.phase.rank(),
            "phase regression {} -> {}",
            self.phase,
            to
        );
        if to.rank() < self.phase.rank() {
            tracing::error!(from = %self.phase, to = %to, "refused phase regression");
            return;
        }
        self.phase = to;
    }

    /// Forced reset: captor died, or the object itself died while held.
    /// Skips the animated sequence entirely. Digestion progress persists.
    pub fn force_reset(&mut self) {
        self.phase = Phase::None;
        self.captor = None;
    }

    #[inline]
    pub fn hidden_amount(&self, kind: Compound) -> f32 {
        self.hidden_reserves
            .as_ref()
            .and_then(|r| r.get(&kind))
            .copied()
            .unwrap_or(0.0)
    }

    /// Take up to `amount` of `kind` from the hidden reserve, returning
    /// how much was actually taken.
    pub fn take_hidden(&mut self, kind: Compound, amount: f32) -> f32 {
        let Some(reserves) = self.hidden_reserves.as_mut() else {
            return 0.0;
        };
        let Some(stored) = reserves.get_mut(&kind) else {
            return 0.0;
        };
        let taken = amount.min(*stored).max(0.0);
        *stored -= taken;
        taken
    }

    /// Total digestible material in the hidden reserve.
    pub fn total_hidden_digestible(&self) -> f32 {
        self.hidden_reserves
            .as_ref()
            .map(|r| {
                r.iter()
                    .filter(|(k, _)| k.is_digestible())
                    .map(|(_, &a)| a)
                    .sum()
            })
            .unwrap_or(0.0)
    }
}

/// A simulated organism. Capabilities are optional: a capturer carries
/// `containment`, a capturable object carries `containable`, and an
/// organism may carry both (chained containment).
#[derive(Debug, Clone)]
pub struct Organism {
    pub species: SpeciesId,
    pub health: f32,
    pub max_health: f32,
    /// Containable volume before digestion shrinkage
    pub base_size: f32,
    /// Boundary geometry computed and ready (positioning collaborator)
    pub membrane_ready: bool,
    pub compounds: CompoundBag,
    pub containment: Option<Containment>,
    pub containable: Option<Containable>,
}

impl Organism {
    pub fn new(species: SpeciesId, base_size: f32) -> Self {
        Organism {
            species,
            health: 100.0,
            max_health: 100.0,
            base_size,
            membrane_ready: true,
            compounds: CompoundBag::new(base_size * 10.0),
            containment: None,
            containable: None,
        }
    }

    pub fn with_containment(mut self, containment: Containment) -> Self {
        self.containment = Some(containment);
        self
    }

    pub fn with_containable(mut self, containable: Containable) -> Self {
        self.containable = Some(containable);
        self
    }

    pub fn with_compounds(mut self, compounds: CompoundBag) -> Self {
        self.compounds = compounds;
        self
    }

    #[inline]
    pub fn alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }

    pub fn kill(&mut self) {
        self.health = 0.0;
    }

    /// Current containable volume: shrinks as digestion proceeds. This is
    /// the only size the capacity ledger sees after capture.
    #[inline]
    pub fn adjusted_size(&self) -> f32 {
        let fraction = self
            .containable
            .as_ref()
            .map(|c| c.digested_fraction)
            .unwrap_or(0.0);
        self.base_size * (1.0 - fraction).max(0.0)
    }

    /// Total digestible material remaining: visible store plus hidden
    /// reserves.
    pub fn remaining_digestible(&self) -> f32 {
        let hidden = self
            .containable
            .as_ref()
            .map(|c| c.total_hidden_digestible())
            .unwrap_or(0.0);
        self.compounds.total_digestible() + hidden
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.containable.as_ref().map(|c| c.phase).unwrap_or(Phase::None)
    }

    #[inline]
    pub fn captor(&self) -> Option<OrganismId> {
        self.containable.as_ref().and_then(|c| c.captor)
    }
}
