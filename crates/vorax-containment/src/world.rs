//! World arena
//!
//! Generation-checked slot arena. Each live slot owns its organism behind
//! a `parking_lot::Mutex`, giving the fine-grained per-organism exclusive
//! sections the capture race requires without a whole-world lock. No
//! engine code path ever holds two slot locks at once.

use parking_lot::{Mutex, MutexGuard};

use vorax_core::OrganismId;

use crate::Organism;

#[derive(Debug, Default)]
struct Slot {
    generation: u16,
    organism: Option<Mutex<Organism>>,
}

/// Slot arena for all simulated organisms.
#[derive(Debug, Default)]
pub struct World {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl World {
    pub fn new() -> Self {
        World::default()
    }

    /// Insert an organism, reusing a free slot when available.
    pub fn spawn(&mut self, organism: Organism) -> OrganismId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.organism = Some(Mutex::new(organism));
            return OrganismId::from_parts(slot.generation, index as u64);
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            organism: Some(Mutex::new(organism)),
        });
        OrganismId::from_parts(0, index as u64)
    }

    /// Remove an organism, bumping the slot generation so stale handles
    /// stop resolving.
    pub fn despawn(&mut self, id: OrganismId) -> Option<Organism> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let organism = slot.organism.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(organism.into_inner())
    }

    /// Lock an organism by handle. Stale or dangling handles resolve to
    /// `None` rather than another slot occupant.
    pub fn get(&self, id: OrganismId) -> Option<MutexGuard<'_, Organism>> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.organism.as_ref().map(|m| m.lock())
    }

    pub fn contains(&self, id: OrganismId) -> bool {
        self.slots
            .get(id.index())
            .map(|s| s.generation == id.generation() && s.organism.is_some())
            .unwrap_or(false)
    }

    /// Handles of all live organisms, in slot order.
    pub fn ids(&self) -> Vec<OrganismId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.organism.is_some())
            .map(|(i, s)| OrganismId::from_parts(s.generation, i as u64))
            .collect()
    }

    /// Handles of all live organisms with containment capability. Each
    /// capturer's held list is private to it, so digestion across the
    /// returned set is independent.
    pub fn capturer_ids(&self) -> Vec<OrganismId> {
        self.ids()
            .into_iter()
            .filter(|&id| {
                self.get(id)
                    .map(|o| o.containment.is_some())
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.organism.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
