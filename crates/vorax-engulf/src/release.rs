//! Release controller
//!
//! Transitions held objects back to free through the phased expulsion
//! sequence, forwards ejected objects up the containment chain when the
//! releasing capturer is itself held, and handles the two forced-reset
//! paths: capturer death and held-object death.

use vorax_containment::World;
use vorax_core::{EngulfBus, OrganismId, Phase, PhysicsIntent, PresentationRequest};

use crate::capture::{CaptureConfig, CaptureController};

#[derive(Clone, Debug)]
pub struct ReleaseConfig {
    /// Seconds a just-ejected object stays blocked from re-capture by the
    /// releasing capturer
    pub recapture_cooldown: f32,
    /// Outward impulse magnitude per unit of adjusted size
    pub eject_impulse_factor: f32,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            recapture_cooldown: 2.0,
            eject_impulse_factor: 5.0,
        }
    }
}

pub struct ReleaseController {
    config: ReleaseConfig,
    /// Chain forwarding re-admits via the normal capture path
    capture: CaptureController,
}

impl ReleaseController {
    pub fn new(config: ReleaseConfig, capture_config: CaptureConfig) -> Self {
        ReleaseController {
            config,
            capture: CaptureController::new(capture_config),
        }
    }

    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Ask for `object` to be expelled from `captor`.
    ///
    /// No-op when a release is already in progress, when the object is not
    /// actually held by `captor`, or when `captor` is itself held and the
    /// request is not forced (a held capturer cannot voluntarily release).
    /// Returns whether the expulsion sequence was started.
    pub fn request_release(
        &self,
        world: &World,
        bus: &EngulfBus,
        captor_id: OrganismId,
        object_id: OrganismId,
        forced: bool,
    ) -> bool {
        // Guard on the capturer first: a held capturer only releases under
        // force (its own death or its container's)
        {
            let Some(captor) = world.get(captor_id) else {
                return false;
            };
            if captor.phase().is_held() && !forced {
                return false;
            }
            let holds = captor
                .containment
                .as_ref()
                .map(|c| c.is_holding(object_id))
                .unwrap_or(false);
            if !holds {
                return false;
            }
        }

        {
            let Some(mut object) = world.get(object_id) else {
                return false;
            };
            let Some(containable) = object.containable.as_mut() else {
                return false;
            };
            if containable.phase.release_in_progress()
                || matches!(containable.phase, Phase::RequestExocytosis | Phase::Digested)
            {
                return false;
            }
            if containable.captor != Some(captor_id) {
                tracing::warn!(
                    %captor_id,
                    object = %object_id,
                    recorded = ?containable.captor,
                    "release requested by non-captor"
                );
                return false;
            }
            containable.advance(Phase::RequestExocytosis);
        }

        bus.push_presentation(PresentationRequest::BeginExpulsion {
            captor: captor_id,
            object: object_id,
        });
        true
    }

    /// Presentation accepted the expulsion: `RequestExocytosis -> Exocytosis`.
    pub fn on_expulsion_begun(&self, world: &World, object_id: OrganismId) {
        self.advance_if(world, object_id, Phase::RequestExocytosis, Phase::Exocytosis);
    }

    /// Expulsion animation finished: `Exocytosis -> Ejection`.
    pub fn on_expulsion_animated(&self, world: &World, object_id: OrganismId) {
        self.advance_if(world, object_id, Phase::Exocytosis, Phase::Ejection);
    }

    /// Object fully outside the capturer: finish the release.
    pub fn on_expulsion_complete(&self, world: &World, bus: &EngulfBus, object_id: OrganismId) {
        let captor_id = {
            let Some(object) = world.get(object_id) else {
                return;
            };
            if object.phase() != Phase::Ejection {
                return;
            }
            let Some(captor_id) = object.captor() else {
                return;
            };
            captor_id
        };
        self.complete_release(world, bus, captor_id, object_id);
    }

    /// Final step of a phased release: detach the object, credit the
    /// ledger, start the re-capture cooldown, hand the body back to
    /// physics, and forward up the containment chain when applicable.
    pub fn complete_release(
        &self,
        world: &World,
        bus: &EngulfBus,
        captor_id: OrganismId,
        object_id: OrganismId,
    ) {
        let adjusted_size = {
            let Some(mut object) = world.get(object_id) else {
                return;
            };
            let size = object.adjusted_size();
            if let Some(containable) = object.containable.as_mut() {
                // End of the normal sequence; not a regression
                containable.phase = Phase::None;
                containable.captor = None;
            }
            size
        };

        let outer = {
            let Some(mut captor) = world.get(captor_id) else {
                return;
            };
            let outer = captor.captor().filter(|_| captor.phase().is_held());
            let Some(containment) = captor.containment.as_mut() else {
                return;
            };
            if !containment.remove(object_id, adjusted_size) {
                // Scheduling-order bug upstream: completing a release for
                // an object that is not held. Loud in development, logged
                // no-op in production.
                debug_assert!(false, "complete_release on object not in held list");
                tracing::error!(
                    %captor_id,
                    object = %object_id,
                    "complete_release called for object not in held list"
                );
                return;
            }
            containment.note_released(object_id, self.config.recapture_cooldown);
            outer
        };

        bus.push_physics(PhysicsIntent::EnableBody {
            object: object_id,
            impulse_magnitude: adjusted_size * self.config.eject_impulse_factor,
        });

        // Chain forwarding: expulsion from a contained capturer funnels the
        // object one level up rather than into open space. A dead or
        // refusing outer capturer leaves the object free.
        if let Some(outer_id) = outer {
            let outer_alive = world.get(outer_id).map(|o| o.alive()).unwrap_or(false);
            if outer_alive {
                let _ = self.capture.try_capture(world, bus, outer_id, object_id);
            }
        }
    }

    /// Forced teardown when a capturer dies: every held object is snapped
    /// straight to `None` (no animation), the ledger and cooldowns are
    /// cleared, and each object is forwarded to the dead capturer's own
    /// captor when there is a live one.
    pub fn handle_capturer_death(&self, world: &World, bus: &EngulfBus, captor_id: OrganismId) {
        let (held, outer) = {
            let Some(mut captor) = world.get(captor_id) else {
                return;
            };
            let outer = captor.captor().filter(|_| captor.phase().is_held());
            let Some(containment) = captor.containment.as_mut() else {
                return;
            };
            (containment.clear(), outer)
        };

        let outer_alive = outer
            .map(|id| world.get(id).map(|o| o.alive()).unwrap_or(false))
            .unwrap_or(false);

        for object_id in held {
            {
                let Some(mut object) = world.get(object_id) else {
                    continue;
                };
                if let Some(containable) = object.containable.as_mut() {
                    containable.force_reset();
                }
            }
            bus.push_physics(PhysicsIntent::EnableBody {
                object: object_id,
                impulse_magnitude: 0.0,
            });
            if outer_alive {
                if let Some(outer_id) = outer {
                    let _ = self.capture.try_capture(world, bus, outer_id, object_id);
                }
            }
        }
    }

    /// Forced removal when a held object dies: it leaves containment
    /// without the phased sequence.
    pub fn handle_held_object_death(&self, world: &World, object_id: OrganismId) {
        let (captor_id, adjusted_size) = {
            let Some(mut object) = world.get(object_id) else {
                return;
            };
            let size = object.adjusted_size();
            let Some(containable) = object.containable.as_mut() else {
                return;
            };
            let Some(captor_id) = containable.captor else {
                return;
            };
            containable.force_reset();
            (captor_id, size)
        };

        if let Some(mut captor) = world.get(captor_id) {
            if let Some(containment) = captor.containment.as_mut() {
                if !containment.remove(object_id, adjusted_size) {
                    tracing::warn!(
                        %captor_id,
                        object = %object_id,
                        "dead held object was not in captor's held list"
                    );
                }
            }
        }
    }

    fn advance_if(&self, world: &World, object_id: OrganismId, from: Phase, to: Phase) {
        let Some(mut object) = world.get(object_id) else {
            return;
        };
        let Some(containable) = object.containable.as_mut() else {
            return;
        };
        // Stale signals (object force-reset meanwhile) are ignored
        if containable.phase != from {
            return;
        }
        containable.advance(to);
    }
}

impl Default for ReleaseController {
    fn default() -> Self {
        ReleaseController::new(ReleaseConfig::default(), CaptureConfig::default())
    }
}
