//! Capture controller
//!
//! Transitions a free object into a capturer. The double-capture race is
//! decided by the `None -> Ingestion` check-and-set under the target's own
//! slot lock; admission into the capturer happens afterwards under the
//! capturer's lock and rolls the reservation back if capacity was consumed
//! by a concurrent capture in between. Never holds two slot locks at once.

use vorax_containment::World;
use vorax_core::{
    CaptureRejection, CaptureResult, EngulfBus, Notice, OrganismId, Phase, PhysicsIntent,
    PresentationRequest,
};

/// Capture eligibility tuning.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    /// Capturer volume must be at least this multiple of the target's
    /// adjusted size. The exact policy belongs to the behavior
    /// collaborator; this is the comparison hook it tunes.
    pub size_ratio_required: f32,
    /// Shrink scale requested from the presentation layer while held
    pub held_scale_target: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            size_ratio_required: 1.5,
            held_scale_target: 0.6,
        }
    }
}

/// Snapshot of capturer state used for the target-side checks.
struct CapturerView {
    size: f32,
    used: f32,
    capacity: f32,
}

pub struct CaptureController {
    config: CaptureConfig,
}

impl CaptureController {
    pub fn new(config: CaptureConfig) -> Self {
        CaptureController { config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Attempt to capture `target` into `captor`.
    ///
    /// Preconditions are checked in contract order; rejections are normal
    /// gameplay outcomes. Exactly one of two racing captures on the same
    /// free target succeeds.
    pub fn try_capture(
        &self,
        world: &World,
        bus: &EngulfBus,
        captor_id: OrganismId,
        target_id: OrganismId,
    ) -> CaptureResult {
        if captor_id == target_id {
            return Err(CaptureRejection::InvalidTarget);
        }

        // Target validity comes first in the contract order, so an
        // already-contained target reports `AlreadyContained` even when the
        // capturer side would also refuse. The reserve step below re-checks
        // all of this under the same lock; this pass only fixes the
        // rejection code ordering.
        {
            let target = world
                .get(target_id)
                .ok_or(CaptureRejection::InvalidTarget)?;
            if target.containable.is_none() {
                return Err(CaptureRejection::InvalidTarget);
            }
            if target.phase() != Phase::None {
                return Err(CaptureRejection::AlreadyContained);
            }
            if !target.alive() {
                return Err(CaptureRejection::InvalidTarget);
            }
        }

        let view = self.capturer_view(world, captor_id, target_id)?;

        // Target critical section: validate and reserve. Whoever flips
        // None -> Ingestion here wins the race.
        let reserved_size = {
            let mut target = world
                .get(target_id)
                .ok_or(CaptureRejection::InvalidTarget)?;

            if target.containable.is_none() {
                return Err(CaptureRejection::InvalidTarget);
            }
            match target.phase() {
                Phase::None => {}
                _ => return Err(CaptureRejection::AlreadyContained),
            }
            if !target.alive() {
                return Err(CaptureRejection::InvalidTarget);
            }
            if !target.membrane_ready {
                return Err(CaptureRejection::InvalidTarget);
            }

            let size = target.adjusted_size();
            if view.used + size > view.capacity {
                bus.push_notice(Notice::StorageFull { captor: captor_id });
                return Err(CaptureRejection::StorageFull);
            }
            if view.size < size * self.config.size_ratio_required {
                return Err(CaptureRejection::TargetTooBig);
            }

            let initial_total = target.remaining_digestible();
            let Some(containable) = target.containable.as_mut() else {
                return Err(CaptureRejection::InvalidTarget);
            };
            containable.advance(Phase::Ingestion);
            containable.captor = Some(captor_id);
            // Snapshot taken once at capture time, never recomputed later
            containable.initial_total = initial_total;
            containable.capability_notified = false;
            containable.baseline_fault_logged = false;
            size
        };

        // Admission under the capturer's lock. Capacity may have been
        // consumed by a concurrent capture since the snapshot; re-validate
        // and roll the reservation back on failure.
        let admitted = {
            match world.get(captor_id) {
                Some(mut captor) if captor.alive() => captor
                    .containment
                    .as_mut()
                    .map(|c| c.admit(target_id, reserved_size))
                    .unwrap_or(false),
                _ => false,
            }
        };

        if !admitted {
            if let Some(mut target) = world.get(target_id) {
                if let Some(containable) = target.containable.as_mut() {
                    containable.force_reset();
                }
            }
            bus.push_notice(Notice::StorageFull { captor: captor_id });
            return Err(CaptureRejection::StorageFull);
        }

        bus.push_physics(PhysicsIntent::DisableBody { object: target_id });
        bus.push_presentation(PresentationRequest::BeginIngestion {
            captor: captor_id,
            object: target_id,
            placement: [0.0, 0.0, 0.0],
            scale_target: self.config.held_scale_target,
        });

        Ok(())
    }

    /// The placement transport finished: the capture completes and the
    /// object becomes digestion eligible.
    pub fn on_ingestion_complete(&self, world: &World, object_id: OrganismId) {
        let Some(mut object) = world.get(object_id) else {
            return;
        };
        let Some(containable) = object.containable.as_mut() else {
            return;
        };
        // Stale signal for an object that already moved on (forced reset,
        // cancelled capture): ignore
        if containable.phase != Phase::Ingestion {
            return;
        }
        containable.advance(Phase::Ingested);
    }

    /// Cancel a capture that has not yet completed. Legal only before the
    /// phase reaches `Ingested`.
    pub fn cancel_capture(
        &self,
        world: &World,
        bus: &EngulfBus,
        captor_id: OrganismId,
        target_id: OrganismId,
    ) -> bool {
        let size = {
            let Some(mut target) = world.get(target_id) else {
                return false;
            };
            let size = target.adjusted_size();
            let Some(containable) = target.containable.as_mut() else {
                return false;
            };
            if containable.phase != Phase::Ingestion || containable.captor != Some(captor_id) {
                return false;
            }
            containable.force_reset();
            size
        };

        if let Some(mut captor) = world.get(captor_id) {
            if let Some(containment) = captor.containment.as_mut() {
                containment.remove(target_id, size);
            }
        }

        bus.push_physics(PhysicsIntent::EnableBody {
            object: target_id,
            impulse_magnitude: 0.0,
        });
        true
    }

    /// Capturer-side preconditions, checked under the capturer's lock.
    fn capturer_view(
        &self,
        world: &World,
        captor_id: OrganismId,
        target_id: OrganismId,
    ) -> Result<CapturerView, CaptureRejection> {
        let captor = world.get(captor_id).ok_or(CaptureRejection::InvalidTarget)?;
        if !captor.alive() || !captor.membrane_ready {
            return Err(CaptureRejection::InvalidTarget);
        }
        let containment = captor
            .containment
            .as_ref()
            .ok_or(CaptureRejection::InvalidTarget)?;
        // Recently ejected by this capturer: blocked until cooldown expiry
        if containment.cooldown_remaining(target_id) > 0.0 {
            return Err(CaptureRejection::InvalidTarget);
        }
        Ok(CapturerView {
            size: captor.adjusted_size(),
            used: containment.ledger().used(),
            capacity: containment.ledger().capacity(),
        })
    }
}

impl Default for CaptureController {
    fn default() -> Self {
        CaptureController::new(CaptureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vorax_containment::{Containable, Containment, Organism};
    use vorax_core::{CompoundBag, Compound, EnzymeLevels, SpeciesId};

    fn capturer(capacity: f32, size: f32) -> Organism {
        Organism::new(SpeciesId::new(1), size)
            .with_containment(Containment::new(capacity, EnzymeLevels::default()))
    }

    fn prey(size: f32) -> Organism {
        Organism::new(SpeciesId::new(2), size)
            .with_compounds(CompoundBag::with_contents(50.0, &[(Compound::Glucose, 5.0)]))
            .with_containable(Containable::new())
    }

    #[test]
    fn test_successful_capture_sets_state() {
        let mut world = World::new();
        let a = world.spawn(capturer(10.0, 10.0));
        let b = world.spawn(prey(2.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        assert!(ctl.try_capture(&world, &bus, a, b).is_ok());

        let target = world.get(b).unwrap();
        assert_eq!(target.phase(), Phase::Ingestion);
        assert_eq!(target.captor(), Some(a));
        assert_eq!(target.containable.as_ref().unwrap().initial_total, 5.0);
        drop(target);

        let captor = world.get(a).unwrap();
        let containment = captor.containment.as_ref().unwrap();
        assert!(containment.is_holding(b));
        assert_eq!(containment.ledger().used(), 2.0);
        drop(captor);

        assert_eq!(bus.drain_physics().len(), 1);
        assert_eq!(bus.drain_presentation().len(), 1);
    }

    #[test]
    fn test_second_capture_rejected() {
        let mut world = World::new();
        let a = world.spawn(capturer(10.0, 10.0));
        let b = world.spawn(capturer(10.0, 10.0));
        let target = world.spawn(prey(2.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        assert!(ctl.try_capture(&world, &bus, a, target).is_ok());
        assert_eq!(
            ctl.try_capture(&world, &bus, b, target),
            Err(CaptureRejection::AlreadyContained)
        );
    }

    #[test]
    fn test_contained_target_outranks_capturer_rejection() {
        let mut world = World::new();
        let a = world.spawn(capturer(10.0, 10.0));
        let unready = {
            let mut o = capturer(10.0, 10.0);
            o.membrane_ready = false;
            world.spawn(o)
        };
        let target = world.spawn(prey(2.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        ctl.try_capture(&world, &bus, a, target).unwrap();
        // Target-side validity is reported before capturer-side problems
        assert_eq!(
            ctl.try_capture(&world, &bus, unready, target),
            Err(CaptureRejection::AlreadyContained)
        );
    }

    #[test]
    fn test_storage_full_rejection() {
        let mut world = World::new();
        let a = world.spawn(capturer(1.0, 10.0));
        let b = world.spawn(prey(2.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        assert_eq!(
            ctl.try_capture(&world, &bus, a, b),
            Err(CaptureRejection::StorageFull)
        );
        // Rejection surfaced as a notice, state untouched
        assert_eq!(bus.drain_notices().len(), 1);
        assert_eq!(world.get(b).unwrap().phase(), Phase::None);
    }

    #[test]
    fn test_target_too_big_rejection() {
        let mut world = World::new();
        let a = world.spawn(capturer(50.0, 2.0));
        let b = world.spawn(prey(3.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        assert_eq!(
            ctl.try_capture(&world, &bus, a, b),
            Err(CaptureRejection::TargetTooBig)
        );
    }

    #[test]
    fn test_dead_or_plain_target_rejected() {
        let mut world = World::new();
        let a = world.spawn(capturer(10.0, 10.0));
        let plain = world.spawn(Organism::new(SpeciesId::new(3), 1.0));
        let dead = {
            let mut o = prey(1.0);
            o.kill();
            world.spawn(o)
        };
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        assert_eq!(
            ctl.try_capture(&world, &bus, a, plain),
            Err(CaptureRejection::InvalidTarget)
        );
        assert_eq!(
            ctl.try_capture(&world, &bus, a, dead),
            Err(CaptureRejection::InvalidTarget)
        );
    }

    #[test]
    fn test_self_capture_rejected() {
        let mut world = World::new();
        let a = world.spawn(capturer(10.0, 10.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();
        assert_eq!(
            ctl.try_capture(&world, &bus, a, a),
            Err(CaptureRejection::InvalidTarget)
        );
    }

    #[test]
    fn test_ingestion_completion_signal() {
        let mut world = World::new();
        let a = world.spawn(capturer(10.0, 10.0));
        let b = world.spawn(prey(2.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        ctl.try_capture(&world, &bus, a, b).unwrap();
        ctl.on_ingestion_complete(&world, b);
        assert_eq!(world.get(b).unwrap().phase(), Phase::Ingested);
    }

    #[test]
    fn test_cancel_before_ingested() {
        let mut world = World::new();
        let a = world.spawn(capturer(10.0, 10.0));
        let b = world.spawn(prey(2.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        ctl.try_capture(&world, &bus, a, b).unwrap();
        assert!(ctl.cancel_capture(&world, &bus, a, b));
        assert_eq!(world.get(b).unwrap().phase(), Phase::None);
        assert_eq!(
            world
                .get(a)
                .unwrap()
                .containment
                .as_ref()
                .unwrap()
                .ledger()
                .used(),
            0.0
        );

        // Once ingested, cancel is refused
        ctl.try_capture(&world, &bus, a, b).unwrap();
        ctl.on_ingestion_complete(&world, b);
        assert!(!ctl.cancel_capture(&world, &bus, a, b));
    }
}
