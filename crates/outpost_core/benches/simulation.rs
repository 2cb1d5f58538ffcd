//! Simulation benchmarks for outpost_core.
//!
//! Run with: `cargo bench -p outpost_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use outpost_core::capture::CaptureTurretConfig;
use outpost_core::drill::MultiDrillConfig;
use outpost_core::math::Vec2Fixed;
use outpost_core::resources::ResourceRegistry;
use outpost_core::simulation::Simulation;
use outpost_core::team::TeamId;
use outpost_core::tiles::{GridMap, TileCoord};
use outpost_core::units::UnitClass;

/// A grid of drills on striped ore and a ring of turrets facing a swarm.
fn outpost(blocks: i32) -> Simulation {
    let mut resources = ResourceRegistry::new();
    let ores = [
        resources.register("copper", 1).unwrap_or_default(),
        resources.register("lead", 1).unwrap_or_default(),
        resources.register("titanium", 3).unwrap_or_default(),
    ];

    let mut map = GridMap::new(128, 128);
    for y in 0..128 {
        let ore = ores[usize::try_from(y).unwrap_or(0) % ores.len()];
        map.fill(TileCoord::new(0, y), TileCoord::new(127, y), Some(ore));
    }

    let mut sim = Simulation::new(map, resources);
    for i in 0..blocks {
        let x = 4 + (i % 20) * 6;
        let y = 4 + (i / 20) * 6;
        let _ = sim.place_drill(MultiDrillConfig::default(), TileCoord::new(x, y));
        let _ = sim.place_turret(
            CaptureTurretConfig::default(),
            Vec2Fixed::from_ints(x * 8, y * 8),
            TeamId::SHARDED,
        );
    }
    for i in 0..blocks * 4 {
        let class = if i % 3 == 0 { UnitClass::Air } else { UnitClass::Ground };
        sim.units_mut().spawn_unit(
            Vec2Fixed::from_ints((i * 37) % 900, (i * 53) % 900),
            TeamId::CRUX,
            200,
            class,
        );
    }
    sim
}

/// Runs simulation benchmarks for the outpost_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for blocks in [10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, &blocks| {
            let mut sim = outpost(blocks);
            b.iter(|| black_box(sim.tick()));
        });
    }
    group.finish();

    c.bench_function("state_hash", |b| {
        let mut sim = outpost(50);
        for _ in 0..100 {
            sim.tick();
        }
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
