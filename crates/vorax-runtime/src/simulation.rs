//! VORAX Simulation - tick loop implementation

use parking_lot::Mutex;

use vorax_containment::{Organism, World};
use vorax_core::{CaptureResult, DigestionTuning, EngulfBus, OrganismId, Phase, TransportSignal};
use vorax_engulf::{
    CaptureConfig, CaptureController, DigestionConfig, DigestionProcessor, ReleaseConfig,
    ReleaseController,
};

/// Simulation configuration: the three engine configs in one place.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub capture: CaptureConfig,
    pub digestion: DigestionConfig,
    pub release: ReleaseConfig,
    /// Remove fully digested objects from the world at the end of the tick
    pub despawn_digested: bool,
}

impl SimulationConfig {
    pub fn new() -> Self {
        SimulationConfig {
            capture: CaptureConfig::default(),
            digestion: DigestionConfig::default(),
            release: ReleaseConfig::default(),
            despawn_digested: true,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::new()
    }
}

/// Cumulative counters across the simulation's lifetime.
#[derive(Clone, Debug, Default)]
pub struct SimulationStats {
    pub ticks: u64,
    pub signals_routed: u64,
    pub captures: u64,
    pub capture_rejections: u64,
    pub releases_requested: u64,
    pub capturer_deaths: u64,
    pub held_object_deaths: u64,
    pub orphans_repaired: u64,
    pub objects_digested: u64,
    pub objects_purged: u64,
    pub total_transferred: f64,
}

/// Owns the world and the three engines, and advances everything by one
/// tick at a time. Signals from the presentation collaborator go through
/// [`Simulation::submit_signal`] and are routed at the start of the next
/// tick, so every phase transition happens inside the tick.
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    bus: EngulfBus,
    capture: CaptureController,
    digestion: DigestionProcessor,
    release: ReleaseController,
    inbox: Mutex<Vec<TransportSignal>>,
    stats: SimulationStats,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Simulation {
            capture: CaptureController::new(config.capture.clone()),
            digestion: DigestionProcessor::new(
                config.digestion.clone(),
                Box::new(vorax_core::LinearTuning::default()),
            ),
            release: ReleaseController::new(config.release.clone(), config.capture.clone()),
            config,
            world: World::new(),
            bus: EngulfBus::new(),
            inbox: Mutex::new(Vec::new()),
            stats: SimulationStats::default(),
        }
    }

    /// Like [`Simulation::new`] but with a custom digestion tuning curve.
    pub fn with_tuning(config: SimulationConfig, tuning: Box<dyn DigestionTuning>) -> Self {
        let mut sim = Simulation::new(config);
        sim.digestion = DigestionProcessor::new(sim.config.digestion.clone(), tuning);
        sim
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn bus(&self) -> &EngulfBus {
        &self.bus
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn spawn(&mut self, organism: Organism) -> OrganismId {
        self.world.spawn(organism)
    }

    /// Attempt a capture immediately (captures are player/AI initiated,
    /// not tick-scheduled).
    pub fn try_capture(&mut self, captor: OrganismId, target: OrganismId) -> CaptureResult {
        let result = self.capture.try_capture(&self.world, &self.bus, captor, target);
        match result {
            Ok(()) => self.stats.captures += 1,
            Err(_) => self.stats.capture_rejections += 1,
        }
        result
    }

    /// Ask for a voluntary release of `object` from `captor`. Refused while
    /// a release is already running or while the captor is itself held.
    pub fn request_release(&mut self, captor: OrganismId, object: OrganismId) -> bool {
        let started = self
            .release
            .request_release(&self.world, &self.bus, captor, object, false);
        if started {
            self.stats.releases_requested += 1;
        }
        started
    }

    /// Kill an organism and remove it from the world, routing through the
    /// forced-reset paths first so nothing keeps a handle to the slot.
    pub fn kill(&mut self, id: OrganismId) {
        let (was_capturer, was_held) = {
            let Some(mut organism) = self.world.get(id) else {
                return;
            };
            organism.kill();
            (
                organism
                    .containment
                    .as_ref()
                    .map(|c| !c.held().is_empty())
                    .unwrap_or(false),
                organism.phase().is_held(),
            )
        };
        if was_capturer {
            self.release.handle_capturer_death(&self.world, &self.bus, id);
            self.stats.capturer_deaths += 1;
        }
        if was_held {
            self.release.handle_held_object_death(&self.world, id);
            self.stats.held_object_deaths += 1;
        }
        self.world.despawn(id);
    }

    /// Queue a completion signal from the presentation collaborator. Safe
    /// to call from any thread; routed at the start of the next tick.
    pub fn submit_signal(&self, signal: TransportSignal) {
        self.inbox.lock().push(signal);
    }

    /// Advance the simulation by `delta` seconds.
    pub fn tick(&mut self, delta: f32) {
        self.route_signals();
        self.sweep_deaths();

        let capturers = self.world.capturer_ids();

        // Cooldown decay and digestion, per live capturer
        for &captor_id in &capturers {
            let alive = {
                let Some(mut captor) = self.world.get(captor_id) else {
                    continue;
                };
                if let Some(containment) = captor.containment.as_mut() {
                    containment.tick_cooldowns(delta);
                }
                captor.alive()
            };
            if !alive {
                continue;
            }
            let report =
                self.digestion
                    .process_capturer(&self.world, &self.bus, &self.release, captor_id, delta);
            self.stats.objects_digested += u64::from(report.completed);
            self.stats.orphans_repaired += u64::from(report.orphans_repaired);
            self.stats.releases_requested += u64::from(report.releases_requested);
            self.stats.total_transferred += f64::from(report.transferred);
        }

        // Toxin damage during digestion can kill a capturer mid-tick
        self.sweep_deaths();

        if self.config.despawn_digested {
            self.purge_digested(&capturers);
        }

        self.stats.ticks += 1;
    }

    fn route_signals(&mut self) {
        let signals = std::mem::take(&mut *self.inbox.lock());
        for signal in signals {
            self.stats.signals_routed += 1;
            match signal {
                TransportSignal::IngestionComplete(id) => {
                    self.capture.on_ingestion_complete(&self.world, id);
                }
                TransportSignal::ExpulsionBegun(id) => {
                    self.release.on_expulsion_begun(&self.world, id);
                }
                TransportSignal::ExpulsionAnimated(id) => {
                    self.release.on_expulsion_animated(&self.world, id);
                }
                TransportSignal::ExpulsionComplete(id) => {
                    self.release.on_expulsion_complete(&self.world, &self.bus, id);
                }
            }
        }
    }

    /// Dead capturers force-release everything they hold; dead held objects
    /// leave their capturer without the phased sequence. Capturer deaths run
    /// first so a dead capturer's contents are forwarded before the
    /// held-object sweep looks at them.
    fn sweep_deaths(&mut self) {
        for captor_id in self.world.capturer_ids() {
            let (alive, held_any) = {
                let Some(captor) = self.world.get(captor_id) else {
                    continue;
                };
                let held_any = captor
                    .containment
                    .as_ref()
                    .map(|c| !c.held().is_empty())
                    .unwrap_or(false);
                (captor.alive(), held_any)
            };
            if !alive && held_any {
                tracing::debug!(%captor_id, "capturer died, force-releasing contents");
                self.release
                    .handle_capturer_death(&self.world, &self.bus, captor_id);
                self.stats.capturer_deaths += 1;
                continue;
            }
            if !alive {
                continue;
            }

            let held = {
                let Some(captor) = self.world.get(captor_id) else {
                    continue;
                };
                match captor.containment.as_ref() {
                    Some(c) => c.held().to_vec(),
                    None => continue,
                }
            };
            for object_id in held {
                let dead = self
                    .world
                    .get(object_id)
                    .map(|o| !o.alive())
                    .unwrap_or(false);
                if dead {
                    tracing::debug!(object = %object_id, "held object died");
                    self.release.handle_held_object_death(&self.world, object_id);
                    self.stats.held_object_deaths += 1;
                }
            }
        }
    }

    /// Remove fully digested objects: final ledger debit, held-list removal,
    /// then despawn. Their remaining adjusted size is near zero by this
    /// point, so the debit is a formality that keeps the ledger exact.
    fn purge_digested(&mut self, capturers: &[OrganismId]) {
        let mut to_despawn = Vec::new();
        for &captor_id in capturers {
            let held = {
                let Some(captor) = self.world.get(captor_id) else {
                    continue;
                };
                match captor.containment.as_ref() {
                    Some(c) => c.held().to_vec(),
                    None => continue,
                }
            };
            for object_id in held {
                let (size, holds_contents) = {
                    let Some(object) = self.world.get(object_id) else {
                        continue;
                    };
                    if object.phase() != Phase::Digested {
                        continue;
                    }
                    let holds_contents = object
                        .containment
                        .as_ref()
                        .map(|c| !c.held().is_empty())
                        .unwrap_or(false);
                    (object.adjusted_size(), holds_contents)
                };
                // A digested object that is itself a capturer departs like
                // a dying host: its contents are force-released and
                // forwarded to the outer capturer, never stranded behind a
                // despawned slot.
                if holds_contents {
                    self.release
                        .handle_capturer_death(&self.world, &self.bus, object_id);
                }
                if let Some(mut captor) = self.world.get(captor_id) {
                    if let Some(containment) = captor.containment.as_mut() {
                        containment.remove(object_id, size);
                    }
                }
                to_despawn.push(object_id);
            }
        }
        for object_id in to_despawn {
            self.world.despawn(object_id);
            self.stats.objects_purged += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vorax_containment::{Containable, Containment};
    use vorax_core::{
        Compound, CompoundBag, CompoundStore, Enzyme, EnzymeLevels, Notice, PhysicsIntent,
        SpeciesId, StatEvent,
    };

    fn capturer(capacity: f32, size: f32) -> Organism {
        Organism::new(SpeciesId::new(1), size)
            .with_compounds(CompoundBag::new(100.0))
            .with_containment(Containment::new(capacity, EnzymeLevels::default()))
    }

    fn prey(size: f32, glucose: f32) -> Organism {
        Organism::new(SpeciesId::new(2), size)
            .with_compounds(CompoundBag::with_contents(50.0, &[(Compound::Glucose, glucose)]))
            .with_containable(Containable::new())
    }

    #[test]
    fn test_full_lifecycle_capture_digest_purge() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(20.0, 10.0));
        let b = sim.spawn(prey(2.0, 3.0));

        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.5);
        assert_eq!(sim.world().get(b).unwrap().phase(), Phase::Ingested);

        // Default tuning drains 0.5 glucose per 0.5s tick
        for _ in 0..10 {
            sim.tick(0.5);
        }

        // Digested and purged from the world
        assert!(!sim.world().contains(b));
        assert_eq!(sim.stats().objects_digested, 1);
        assert_eq!(sim.stats().objects_purged, 1);

        let captor = sim.world().get(a).unwrap();
        // 3.0 transferred at 0.6 efficiency
        assert!((captor.compounds.amount(Compound::Glucose) - 1.8).abs() < 1e-4);
        let containment = captor.containment.as_ref().unwrap();
        assert!(containment.held().is_empty());
        assert_eq!(containment.ledger().used(), 0.0);
        drop(captor);

        let stats = sim.bus().drain_stats();
        assert!(stats
            .iter()
            .any(|s| matches!(s, StatEvent::ObjectDigested { object, .. } if *object == b)));
        assert!(stats
            .iter()
            .any(|s| matches!(s, StatEvent::SpeciesEngulfTally { .. })));
    }

    #[test]
    fn test_capturer_death_frees_contents_on_tick() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(20.0, 10.0));
        let b = sim.spawn(prey(2.0, 3.0));
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.1);
        sim.bus().drain_physics();

        sim.world().get(a).unwrap().kill();
        sim.tick(0.1);

        let object = sim.world().get(b).unwrap();
        assert_eq!(object.phase(), Phase::None);
        assert_eq!(object.captor(), None);
        drop(object);
        assert_eq!(sim.stats().capturer_deaths, 1);
        assert!(sim
            .bus()
            .drain_physics()
            .iter()
            .any(|p| matches!(p, PhysicsIntent::EnableBody { object, .. } if *object == b)));
    }

    #[test]
    fn test_held_object_death_is_swept() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(20.0, 10.0));
        let b = sim.spawn(prey(2.0, 3.0));
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.1);

        sim.world().get(b).unwrap().kill();
        sim.tick(0.1);

        assert_eq!(sim.stats().held_object_deaths, 1);
        let captor = sim.world().get(a).unwrap();
        let containment = captor.containment.as_ref().unwrap();
        assert!(!containment.is_holding(b));
        assert_eq!(containment.ledger().used(), 0.0);
    }

    #[test]
    fn test_kill_held_object_despawns_cleanly() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(20.0, 10.0));
        let b = sim.spawn(prey(2.0, 3.0));
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.1);

        sim.kill(b);
        // Next settle pass reconciles the ledger after the forced removal
        sim.tick(0.1);
        assert!(!sim.world().contains(b));
        let captor = sim.world().get(a).unwrap();
        let containment = captor.containment.as_ref().unwrap();
        assert!(!containment.is_holding(b));
        assert_eq!(containment.ledger().used(), 0.0);
    }

    #[test]
    fn test_voluntary_release_and_cooldown_decay() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(20.0, 10.0));
        let b = sim.spawn(prey(2.0, 3.0));
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.1);

        assert!(sim.request_release(a, b));
        sim.submit_signal(TransportSignal::ExpulsionBegun(b));
        sim.tick(0.1);
        sim.submit_signal(TransportSignal::ExpulsionAnimated(b));
        sim.tick(0.1);
        sim.submit_signal(TransportSignal::ExpulsionComplete(b));
        sim.tick(0.1);

        assert_eq!(sim.world().get(b).unwrap().phase(), Phase::None);

        // Default cooldown is 2s: blocked now, open after decay
        assert!(sim.try_capture(a, b).is_err());
        for _ in 0..25 {
            sim.tick(0.1);
        }
        assert!(sim.try_capture(a, b).is_ok());
    }

    #[test]
    fn test_indigestible_object_is_expelled() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(20.0, 10.0));
        let b = sim.spawn(
            Organism::new(SpeciesId::new(3), 2.0)
                .with_compounds(CompoundBag::with_contents(
                    50.0,
                    &[(Compound::Glucose, 3.0)],
                ))
                .with_containable(Containable::requiring(Enzyme::Chitinase)),
        );
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.1);
        sim.tick(0.1);

        // Digestion refused it and asked for expulsion instead
        assert_eq!(sim.world().get(b).unwrap().phase(), Phase::RequestExocytosis);
        let notices: Vec<_> = sim
            .bus()
            .drain_notices()
            .into_iter()
            .filter(|n| matches!(n, Notice::MissingDigestiveCapability { .. }))
            .collect();
        assert_eq!(notices.len(), 1);

        sim.submit_signal(TransportSignal::ExpulsionBegun(b));
        sim.tick(0.1);
        sim.submit_signal(TransportSignal::ExpulsionAnimated(b));
        sim.tick(0.1);
        sim.submit_signal(TransportSignal::ExpulsionComplete(b));
        sim.tick(0.1);

        let object = sim.world().get(b).unwrap();
        assert_eq!(object.phase(), Phase::None);
        // Nothing was extracted
        assert_eq!(object.compounds.amount(Compound::Glucose), 3.0);
    }

    #[test]
    fn test_chained_capturer_death_forwards_contents() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(50.0, 30.0));
        let b = sim.spawn(
            capturer(20.0, 10.0).with_containable(Containable::new()),
        );
        let c = sim.spawn(prey(2.0, 3.0));

        sim.try_capture(b, c).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(c));
        sim.tick(0.1);
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.1);
        // B carries no digestible material: it must still be held, not
        // waved through digestion
        assert_eq!(sim.world().get(b).unwrap().phase(), Phase::Ingested);

        // B dies inside A: C is forwarded into A rather than freed
        sim.world().get(b).unwrap().kill();
        sim.tick(0.1);

        let object = sim.world().get(c).unwrap();
        assert_eq!(object.captor(), Some(a));
        drop(object);
        assert!(sim
            .world()
            .get(a)
            .unwrap()
            .containment
            .as_ref()
            .unwrap()
            .is_holding(c));
    }

    #[test]
    fn test_digested_capturer_forwards_contents_at_purge() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(50.0, 30.0));
        // B is digestible by A and holds C, which B itself cannot digest
        let b = sim.spawn(
            Organism::new(SpeciesId::new(2), 10.0)
                .with_compounds(CompoundBag::with_contents(50.0, &[(Compound::Glucose, 2.0)]))
                .with_containment(Containment::new(20.0, EnzymeLevels::default()))
                .with_containable(Containable::new()),
        );
        let c = sim.spawn(
            Organism::new(SpeciesId::new(3), 2.0)
                .with_compounds(CompoundBag::with_contents(
                    50.0,
                    &[(Compound::Glucose, 3.0)],
                ))
                .with_containable(Containable::requiring(Enzyme::Chitinase)),
        );

        sim.try_capture(b, c).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(c));
        sim.tick(0.1);
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));

        // A digests B to completion; B is purged from the world
        for _ in 0..10 {
            sim.tick(0.5);
        }
        assert!(!sim.world().contains(b));
        assert_eq!(sim.stats().objects_purged, 1);

        // C was not stranded behind the despawned slot: it was forwarded
        // into A at purge time
        let object = sim.world().get(c).unwrap();
        assert_eq!(object.captor(), Some(a));
        assert_ne!(object.phase(), Phase::None);
        drop(object);
        assert!(sim
            .world()
            .get(a)
            .unwrap()
            .containment
            .as_ref()
            .unwrap()
            .is_holding(c));
    }

    #[test]
    fn test_toxic_digestion_damages_capturer_over_ticks() {
        let mut sim = Simulation::new(SimulationConfig::new());
        let a = sim.spawn(capturer(20.0, 10.0));
        let b = sim.spawn(
            Organism::new(SpeciesId::new(4), 2.0)
                .with_compounds(CompoundBag::with_contents(50.0, &[(Compound::Toxin, 10.0)]))
                .with_containable(Containable::new()),
        );
        sim.try_capture(a, b).unwrap();
        sim.submit_signal(TransportSignal::IngestionComplete(b));
        sim.tick(0.1);

        // Crossing the 1s toxin check interval costs 5% of max health
        for _ in 0..12 {
            sim.tick(0.1);
        }
        let health = sim.world().get(a).unwrap().health;
        assert!(health < 100.0);
    }

    #[test]
    fn test_racing_captures_have_one_winner() {
        let mut world = World::new();
        let a = world.spawn(capturer(20.0, 10.0));
        let b = world.spawn(capturer(20.0, 10.0));
        let target = world.spawn(prey(2.0, 3.0));
        let bus = EngulfBus::new();
        let ctl = CaptureController::default();

        let (res_a, res_b) = std::thread::scope(|s| {
            let ha = s.spawn(|| ctl.try_capture(&world, &bus, a, target));
            let hb = s.spawn(|| ctl.try_capture(&world, &bus, b, target));
            (ha.join().unwrap(), hb.join().unwrap())
        });

        assert_eq!(res_a.is_ok() as u8 + res_b.is_ok() as u8, 1);
        let winner = if res_a.is_ok() { a } else { b };
        assert_eq!(world.get(target).unwrap().captor(), Some(winner));
    }
}
