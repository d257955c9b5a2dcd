//! Digestion processor
//!
//! Runs once per tick per capturer. Settles the capacity ledger from the
//! adjusted sizes of everything still inside (in-flight objects included),
//! repairs orphaned held-list entries, transfers compounds out of ingested
//! objects at enzyme-gated rates, applies the fixed-interval toxin damage
//! rule, and marks fully digested objects.

use vorax_containment::World;
use vorax_core::{
    Compound, CompoundStore, DigestionFault, DigestionTuning, EngulfBus, EnvironmentDeposit,
    EnzymeLevels, LinearTuning, Notice, OrganismId, Phase, StatEvent,
};

use crate::release::ReleaseController;

/// Digestion rate and yield tuning.
#[derive(Clone, Debug)]
pub struct DigestionConfig {
    /// Lower clamp on the efficiency factor
    pub min_yield: f32,
    /// Upper clamp on the efficiency factor
    pub max_yield: f32,
    /// Digested fraction at which an object counts as fully digested
    pub digested_threshold: f32,
    /// Remaining material below this counts as nothing left
    pub remainder_epsilon: f32,
    /// Seconds of simulated time between toxin damage checks
    pub toxin_check_interval: f32,
    /// Damage per toxin check, as a fraction of the capturer's max health
    pub toxin_damage_fraction: f32,
}

impl Default for DigestionConfig {
    fn default() -> Self {
        DigestionConfig {
            min_yield: 0.2,
            max_yield: 0.9,
            digested_threshold: 0.999,
            remainder_epsilon: 1e-3,
            toxin_check_interval: 1.0,
            toxin_damage_fraction: 0.05,
        }
    }
}

/// Per-capturer outcome counters for one digestion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DigestionReport {
    /// Held objects whose size was folded into the settle pass
    pub settled: u32,
    /// Orphaned held-list entries removed defensively
    pub orphans_repaired: u32,
    /// Releases requested for missing digestive capability
    pub releases_requested: u32,
    /// Total compound amount removed from held objects this tick
    pub transferred: f32,
    /// Objects that reached the `Digested` phase this tick
    pub completed: u32,
}

pub struct DigestionProcessor {
    config: DigestionConfig,
    tuning: Box<dyn DigestionTuning>,
}

impl DigestionProcessor {
    pub fn new(config: DigestionConfig, tuning: Box<dyn DigestionTuning>) -> Self {
        DigestionProcessor { config, tuning }
    }

    pub fn config(&self) -> &DigestionConfig {
        &self.config
    }

    /// Advance digestion for one capturer by `delta` seconds.
    ///
    /// Must not run concurrently with a capture or release on the same
    /// capturer; capturers are otherwise independent.
    pub fn process_capturer(
        &self,
        world: &World,
        bus: &EngulfBus,
        release: &ReleaseController,
        captor_id: OrganismId,
        delta: f32,
    ) -> DigestionReport {
        let mut report = DigestionReport::default();

        // Snapshot the held list and enzyme levels under the capturer lock
        let (held, enzymes, captor_species) = {
            let Some(captor) = world.get(captor_id) else {
                return report;
            };
            let Some(containment) = captor.containment.as_ref() else {
                // Scheduling bug upstream: digestion on a capturer with no
                // digestibility data. Fail loudly in development.
                debug_assert!(false, "digestion on organism without containment");
                tracing::error!(%captor_id, "digestion called on organism without containment");
                return report;
            };
            (
                containment.held().to_vec(),
                containment.enzymes().clone(),
                captor.species,
            )
        };

        // Step 1: capacity accounting pass. Everything still inside
        // contributes its current adjusted size, whatever its phase, so
        // the ledger never under-counts in-flight objects.
        let mut recomputed = 0.0;
        let mut orphans = Vec::new();
        let mut ingested = Vec::new();
        for &object_id in &held {
            match world.get(object_id) {
                Some(object) if object.alive() && object.captor() == Some(captor_id) => {
                    let phase = object.phase();
                    if phase.counts_toward_capacity() {
                        recomputed += object.adjusted_size();
                        report.settled += 1;
                    }
                    if phase.digestion_eligible() {
                        ingested.push(object_id);
                    }
                }
                _ => orphans.push(object_id),
            }
        }

        {
            let Some(mut captor) = world.get(captor_id) else {
                return report;
            };
            let Some(containment) = captor.containment.as_mut() else {
                return report;
            };
            for &orphan in &orphans {
                tracing::warn!(
                    %captor_id,
                    object = %orphan,
                    "removing orphaned held-list entry"
                );
                containment.forget(orphan);
                report.orphans_repaired += 1;
            }
            containment.ledger_mut().settle(recomputed);
        }

        // Steps 2-5 per ingested object
        let mut toxin_taken_total = 0.0;
        for object_id in ingested {
            toxin_taken_total +=
                self.digest_object(world, bus, release, captor_id, object_id, &enzymes,
                                   captor_species, delta, &mut report);
        }

        // Toxin damage on a fixed check interval, independent of frame rate
        self.apply_toxin_rule(world, bus, captor_id, toxin_taken_total, delta);

        report
    }

    /// Steps 2-5 for one ingested object. Returns the toxin amount taken.
    #[allow(clippy::too_many_arguments)]
    fn digest_object(
        &self,
        world: &World,
        bus: &EngulfBus,
        release: &ReleaseController,
        captor_id: OrganismId,
        object_id: OrganismId,
        enzymes: &EnzymeLevels,
        captor_species: vorax_core::SpeciesId,
        delta: f32,
        report: &mut DigestionReport,
    ) -> f32 {
        // Step 2: digestibility check
        let requisite = {
            let Some(object) = world.get(object_id) else {
                return 0.0;
            };
            object
                .containable
                .as_ref()
                .and_then(|c| c.requisite_enzyme)
        };

        if !enzymes.can_digest(requisite) {
            let enzyme = requisite.unwrap_or(vorax_core::Enzyme::DEFAULT);
            let notify = {
                let Some(mut object) = world.get(object_id) else {
                    return 0.0;
                };
                let Some(containable) = object.containable.as_mut() else {
                    return 0.0;
                };
                let first = !containable.capability_notified;
                containable.capability_notified = true;
                first
            };
            if notify {
                tracing::debug!(
                    %captor_id,
                    object = %object_id,
                    fault = %DigestionFault::MissingCapability(enzyme),
                    "requesting release of indigestible object"
                );
                bus.push_notice(Notice::MissingDigestiveCapability {
                    captor: captor_id,
                    object: object_id,
                    enzyme,
                });
            }
            // The object's size keeps counting toward capacity through the
            // phased release; no special ledger handling needed here.
            if release.request_release(world, bus, captor_id, object_id, false) {
                report.releases_requested += 1;
            }
            return 0.0;
        }

        let level = enzymes.level(requisite.unwrap_or(vorax_core::Enzyme::DEFAULT));
        let rate = self.tuning.speed(level) * delta;
        let efficiency = self
            .tuning
            .efficiency(level)
            .clamp(self.config.min_yield, self.config.max_yield);

        // Step 3: per-resource transfer out of the object
        let mut taken_by_kind: Vec<(Compound, f32)> = Vec::new();
        let mut toxin_taken = 0.0;
        let (completed, tally) = {
            let Some(mut object) = world.get(object_id) else {
                return 0.0;
            };

            for &kind in Compound::all() {
                if !kind.is_digestible() {
                    continue;
                }
                let hidden = object
                    .containable
                    .as_ref()
                    .map(|c| c.hidden_amount(kind))
                    .unwrap_or(0.0);
                let available = object.compounds.amount(kind) + hidden;
                if available <= 0.0 {
                    continue;
                }
                let taken = available.min(rate);

                // Hidden reserve drains first, then the visible store
                let mut left = taken;
                if let Some(containable) = object.containable.as_mut() {
                    left -= containable.take_hidden(kind, left);
                }
                if left > 0.0 {
                    object.compounds.take(kind, left);
                }

                if kind.is_toxic() {
                    toxin_taken += taken;
                }
                report.transferred += taken;
                taken_by_kind.push((kind, taken));
            }

            // Step 4: fraction update
            let remaining = object.remaining_digestible();
            let species = object.species;
            let Some(containable) = object.containable.as_mut() else {
                return toxin_taken;
            };
            if containable.initial_total <= 0.0 {
                if !containable.baseline_fault_logged {
                    containable.baseline_fault_logged = true;
                    tracing::error!(
                        object = %object_id,
                        fault = %DigestionFault::ZeroBaselineQuantity(object_id),
                        "containable captured with zero digestible baseline"
                    );
                }
            } else {
                let computed = (1.0 - remaining / containable.initial_total).clamp(0.0, 1.0);
                // Monotone even if the baseline was re-snapshotted smaller
                containable.digested_fraction = containable.digested_fraction.max(computed);
            }

            // Step 5: completion. A zero baseline never completes: the
            // object did not yield anything, it had nothing to begin with.
            // It stays held with the fault logged until a release or death
            // removes it.
            let done = containable.initial_total > 0.0
                && (remaining <= self.config.remainder_epsilon
                    || containable.digested_fraction >= self.config.digested_threshold);
            let mut tally = None;
            if done && containable.phase == Phase::Ingested {
                containable.advance(Phase::Digested);
                if !containable.tally_offered {
                    containable.tally_offered = true;
                    tally = Some(species);
                }
            }
            (done, tally)
        };

        // Deliver into the capturer's store; surplus that does not fit is
        // expelled back into the environment, never silently discarded.
        {
            let Some(mut captor) = world.get(captor_id) else {
                return toxin_taken;
            };
            for &(kind, taken) in &taken_by_kind {
                let delivered = taken * efficiency;
                let accepted = captor.compounds.add(kind, delivered);
                let surplus = delivered - accepted;
                if surplus > 0.0 {
                    bus.push_deposit(EnvironmentDeposit {
                        source: captor_id,
                        compound: kind,
                        amount: surplus,
                    });
                }
            }
        }

        if completed {
            report.completed += 1;
            bus.push_stat(StatEvent::ObjectDigested {
                captor: captor_id,
                object: object_id,
            });
            if let Some(prey_species) = tally {
                bus.push_stat(StatEvent::SpeciesEngulfTally {
                    predator: captor_species,
                    prey: prey_species,
                });
            }
        }

        toxin_taken
    }

    /// Fixed-interval toxin damage: digesting something toxic hurts the
    /// capturer slowly, on simulated-time checks rather than per frame.
    fn apply_toxin_rule(
        &self,
        world: &World,
        bus: &EngulfBus,
        captor_id: OrganismId,
        toxin_taken: f32,
        delta: f32,
    ) {
        let Some(mut captor) = world.get(captor_id) else {
            return;
        };
        let max_health = captor.max_health;
        let Some(containment) = captor.containment.as_mut() else {
            return;
        };
        containment.record_toxin(toxin_taken);
        let due = containment.toxin_check(self.config.toxin_check_interval, delta);
        if due.is_some() {
            let damage = max_health * self.config.toxin_damage_fraction;
            captor.damage(damage);
            bus.push_notice(Notice::ToxinDigestionDamage {
                captor: captor_id,
                damage,
            });
        }
    }
}

impl Default for DigestionProcessor {
    fn default() -> Self {
        DigestionProcessor::new(
            DigestionConfig::default(),
            Box::new(LinearTuning::default()),
        )
    }
}
