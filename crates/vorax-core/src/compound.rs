//! Compound kinds and storage
//!
//! The digestion processor never reaches into storage internals; it talks
//! to any store through the [`CompoundStore`] trait. [`CompoundBag`] is the
//! concrete store used by organisms.

use std::collections::HashMap;
use std::fmt;

/// Resource kinds that can be stored and digested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Compound {
    Glucose,
    AminoAcid,
    Lipid,
    Iron,
    /// Digesting this hurts the capturer on a fixed interval
    Toxin,
}

impl Compound {
    /// All compound kinds, in transfer order
    pub fn all() -> &'static [Compound] {
        &[
            Compound::Glucose,
            Compound::AminoAcid,
            Compound::Lipid,
            Compound::Iron,
            Compound::Toxin,
        ]
    }

    /// Whether digestion extracts this kind at all
    #[inline]
    pub fn is_digestible(self) -> bool {
        // Iron is carried but not broken down by any enzyme
        !matches!(self, Compound::Iron)
    }

    /// Whether taking this kind damages the capturer over time
    #[inline]
    pub fn is_toxic(self) -> bool {
        matches!(self, Compound::Toxin)
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compound::Glucose => "glucose",
            Compound::AminoAcid => "amino-acid",
            Compound::Lipid => "lipid",
            Compound::Iron => "iron",
            Compound::Toxin => "toxin",
        };
        f.write_str(name)
    }
}

/// Storage interface the core uses for all compound movement.
pub trait CompoundStore {
    /// Remove up to `amount` of `kind`, returning how much was taken
    fn take(&mut self, kind: Compound, amount: f32) -> f32;

    /// Add up to `amount` of `kind`, returning how much was accepted
    fn add(&mut self, kind: Compound, amount: f32) -> f32;

    /// Current stored amount of `kind`
    fn amount(&self, kind: Compound) -> f32;

    /// Maximum storable amount of `kind`
    fn capacity(&self, kind: Compound) -> f32;

    /// Total stored amount across digestible kinds
    fn total_digestible(&self) -> f32 {
        Compound::all()
            .iter()
            .filter(|k| k.is_digestible())
            .map(|&k| self.amount(k))
            .sum()
    }
}

/// Per-kind capped compound storage.
#[derive(Debug, Clone, Default)]
pub struct CompoundBag {
    capacity: f32,
    amounts: HashMap<Compound, f32>,
}

impl CompoundBag {
    /// Create a bag with the same capacity for every kind
    pub fn new(capacity: f32) -> Self {
        CompoundBag {
            capacity,
            amounts: HashMap::new(),
        }
    }

    /// Create a bag pre-filled with the given amounts
    pub fn with_contents(capacity: f32, contents: &[(Compound, f32)]) -> Self {
        let mut bag = CompoundBag::new(capacity);
        for &(kind, amount) in contents {
            bag.add(kind, amount);
        }
        bag
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.values().all(|&a| a <= 0.0)
    }
}

impl CompoundStore for CompoundBag {
    fn take(&mut self, kind: Compound, amount: f32) -> f32 {
        let stored = self.amounts.entry(kind).or_insert(0.0);
        let taken = amount.min(*stored).max(0.0);
        *stored -= taken;
        taken
    }

    fn add(&mut self, kind: Compound, amount: f32) -> f32 {
        let stored = self.amounts.entry(kind).or_insert(0.0);
        let accepted = amount.min(self.capacity - *stored).max(0.0);
        *stored += accepted;
        accepted
    }

    fn amount(&self, kind: Compound) -> f32 {
        self.amounts.get(&kind).copied().unwrap_or(0.0)
    }

    fn capacity(&self, _kind: Compound) -> f32 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_is_bounded_by_stored() {
        let mut bag = CompoundBag::with_contents(10.0, &[(Compound::Glucose, 3.0)]);
        assert_eq!(bag.take(Compound::Glucose, 5.0), 3.0);
        assert_eq!(bag.amount(Compound::Glucose), 0.0);
    }

    #[test]
    fn test_add_is_bounded_by_capacity() {
        let mut bag = CompoundBag::new(4.0);
        assert_eq!(bag.add(Compound::Lipid, 3.0), 3.0);
        // Only one unit of headroom left
        assert_eq!(bag.add(Compound::Lipid, 3.0), 1.0);
        assert_eq!(bag.amount(Compound::Lipid), 4.0);
    }

    #[test]
    fn test_total_digestible_skips_iron() {
        let bag = CompoundBag::with_contents(
            10.0,
            &[(Compound::Glucose, 2.0), (Compound::Iron, 5.0)],
        );
        assert_eq!(bag.total_digestible(), 2.0);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut bag = CompoundBag::new(10.0);
        assert_eq!(bag.add(Compound::Glucose, -1.0), 0.0);
        assert_eq!(bag.take(Compound::Glucose, -1.0), 0.0);
    }
}
