//! Identity types for the engulfment core
//!
//! Cross-entity relations (captor/held edges) are expressed as packed
//! 64-bit handles rather than references, so a held object can be queried
//! for liveness without risking a dangling pointer when its captor is
//! destroyed mid-tick.

use std::fmt;

/// Organism identity - a generation-checked arena handle.
///
/// Format: \[generation:16\]\[index:48\]. The generation is bumped every
/// time an arena slot is reused, so a stale handle never resolves to a
/// newer occupant of the same slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct OrganismId(pub u64);

impl OrganismId {
    pub const ZERO: OrganismId = OrganismId(0);

    /// Create an organism ID from a slot index and generation counter
    #[inline]
    pub fn from_parts(generation: u16, index: u64) -> Self {
        let id = ((generation as u64) << 48) | (index & 0x0000_FFFF_FFFF_FFFF);
        OrganismId(id)
    }

    #[inline]
    pub fn generation(self) -> u16 {
        (self.0 >> 48) as u16
    }

    #[inline]
    pub fn index(self) -> usize {
        (self.0 & 0x0000_FFFF_FFFF_FFFF) as usize
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        OrganismId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Organism({:04x}:{:012x})", self.generation(), self.index())
    }
}

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:012x}", self.generation(), self.index())
    }
}

/// Species identity - used for the cross-session engulf tally pairing
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SpeciesId(pub u32);

impl SpeciesId {
    #[inline]
    pub fn new(id: u32) -> Self {
        SpeciesId(id)
    }
}

impl fmt::Debug for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Species({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organism_id_parts() {
        let id = OrganismId::from_parts(7, 0x0000_1234_5678_9ABC);
        assert_eq!(id.generation(), 7);
        assert_eq!(id.index(), 0x0000_1234_5678_9ABC);
    }

    #[test]
    fn test_organism_id_index_truncation() {
        // Index must be truncated to 48 bits
        let id = OrganismId::from_parts(1, u64::MAX);
        assert_eq!(id.generation(), 1);
        assert_eq!(id.index(), 0x0000_FFFF_FFFF_FFFF);
    }

    #[test]
    fn test_organism_id_roundtrip() {
        let id = OrganismId::from_parts(42, 1337);
        let recovered = OrganismId::from_bytes(id.to_bytes());
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_stale_generation_differs() {
        let old = OrganismId::from_parts(1, 5);
        let reused = OrganismId::from_parts(2, 5);
        assert_ne!(old, reused);
        assert_eq!(old.index(), reused.index());
    }
}
