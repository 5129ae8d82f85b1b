//! Simulation benchmarks for wave_core.
//!
//! Run with: `cargo bench -p wave_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wave_core::prelude::*;
use wave_test_utils::fixtures::{killer_tower, scenario_config};

fn locations(n: i32) -> Vec<SpawnLocation> {
    (0..n)
        .map(|i| SpawnLocation::at(Vec2Fixed::from_ints(i * 10, 0)))
        .collect()
}

/// Allocating waves of increasing size across eight locations.
pub fn allocation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate");
    let spots = locations(8);
    let melee = Percent::saturating(65);

    for total in [10_i64, 1_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(total), &total, |b, &total| {
            b.iter(|| allocate(black_box(total), melee, black_box(&spots)));
        });
    }
    group.finish();
}

/// Ticking a defended simulation through its first waves.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_500_defended", |b| {
        b.iter(|| {
            let mut scene = NullScene;
            let mut config = scenario_config(42);
            config.spawn_locations = locations(4);
            let mut sim = Simulation::new(config).expect("valid config");
            sim.add_tower(Vec2Fixed::from_ints(5, 0), 50_000, killer_tower());
            sim.add_tower(Vec2Fixed::from_ints(25, 0), 50_000, killer_tower());
            sim.start(&mut scene);
            for _ in 0..500 {
                black_box(sim.tick(&mut scene));
            }
            sim.state_hash()
        });
    });
}

criterion_group!(benches, allocation_benchmark, simulation_benchmark);
criterion_main!(benches);
