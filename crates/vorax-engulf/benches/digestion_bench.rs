//! Benchmarks for VORAX engulfment engines

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vorax_containment::{Containable, Containment, Organism, World};
use vorax_core::{Compound, CompoundBag, EngulfBus, EnzymeLevels, OrganismId, SpeciesId};
use vorax_engulf::{CaptureController, DigestionProcessor, ReleaseController};

/// A world with `capturers` capturers, each holding `held_each` ingested prey.
fn populate(capturers: usize, held_each: usize) -> (World, Vec<OrganismId>) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut world = World::new();
    let bus = EngulfBus::new();
    let capture = CaptureController::default();

    let mut captor_ids = Vec::with_capacity(capturers);
    for _ in 0..capturers {
        let captor = world.spawn(
            Organism::new(SpeciesId::new(1), 20.0)
                .with_compounds(CompoundBag::new(1_000.0))
                .with_containment(Containment::new(100.0, EnzymeLevels::default())),
        );
        for _ in 0..held_each {
            let prey = world.spawn(
                Organism::new(SpeciesId::new(2), rng.gen_range(0.5..3.0))
                    .with_compounds(CompoundBag::with_contents(
                        100.0,
                        &[
                            (Compound::Glucose, rng.gen_range(1.0..10.0)),
                            (Compound::Lipid, rng.gen_range(0.0..5.0)),
                        ],
                    ))
                    .with_containable(Containable::new()),
            );
            capture
                .try_capture(&world, &bus, captor, prey)
                .expect("bench setup capture");
            capture.on_ingestion_complete(&world, prey);
        }
        captor_ids.push(captor);
    }
    bus.drain_physics();
    bus.drain_presentation();
    (world, captor_ids)
}

fn bench_capture(c: &mut Criterion) {
    let mut world = World::new();
    let captor = world.spawn(
        Organism::new(SpeciesId::new(1), 20.0)
            .with_containment(Containment::new(f32::MAX, EnzymeLevels::default())),
    );
    let prey = world.spawn(
        Organism::new(SpeciesId::new(2), 1.0)
            .with_compounds(CompoundBag::with_contents(10.0, &[(Compound::Glucose, 5.0)]))
            .with_containable(Containable::new()),
    );
    let bus = EngulfBus::new();
    let capture = CaptureController::default();

    c.bench_function("capture_and_cancel", |b| {
        b.iter(|| {
            capture
                .try_capture(&world, &bus, black_box(captor), black_box(prey))
                .ok();
            capture.cancel_capture(&world, &bus, captor, prey);
            bus.drain_physics();
            bus.drain_presentation();
        })
    });
}

fn bench_digestion_tick_small(c: &mut Criterion) {
    let (world, captors) = populate(10, 5);
    let bus = EngulfBus::new();
    let digestion = DigestionProcessor::default();
    let release = ReleaseController::default();

    c.bench_function("digestion_tick_10x5", |b| {
        b.iter(|| {
            for &captor in &captors {
                black_box(digestion.process_capturer(
                    &world,
                    &bus,
                    &release,
                    captor,
                    black_box(1e-6),
                ));
            }
            bus.drain_stats();
            bus.drain_deposits();
        })
    });
}

fn bench_digestion_tick_large(c: &mut Criterion) {
    let (world, captors) = populate(100, 10);
    let bus = EngulfBus::new();
    let digestion = DigestionProcessor::default();
    let release = ReleaseController::default();

    c.bench_function("digestion_tick_100x10", |b| {
        b.iter(|| {
            for &captor in &captors {
                black_box(digestion.process_capturer(
                    &world,
                    &bus,
                    &release,
                    captor,
                    black_box(1e-6),
                ));
            }
            bus.drain_stats();
            bus.drain_deposits();
        })
    });
}

criterion_group!(
    benches,
    bench_capture,
    bench_digestion_tick_small,
    bench_digestion_tick_large,
);
criterion_main!(benches);
