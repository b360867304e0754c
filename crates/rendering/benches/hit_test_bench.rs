//! Criterion benchmarks for pointer resolution.
//!
//! Benchmarks:
//!   - height-sliced pick over a generated 128x128 world
//!   - flat inverse projection for comparison
//!   - placement check for a 4x4 footprint against 200 buildings
//!
//! Run with: cargo bench -p rendering --bench hit_test_bench

use bevy::math::IVec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rendering::coords::IsoProjection;
use rendering::hit_test::{pick_tile, HitTestConfig};
use rendering::placement::{check_placement, Footprint};
use simulation::snapshot::EntityId;
use simulation::terrain_generation::generate_terrain;
use simulation::world_params::WorldParams;

fn bench_pick(c: &mut Criterion) {
    let grid = generate_terrain(&WorldParams::with_seed(3));
    let projection = IsoProjection::default();
    let config = HitTestConfig::default();
    let point = projection.elevated_to_screen(64.0, 64.0, 4.0);

    let mut group = c.benchmark_group("hit_test");
    group.bench_function("height_sliced_128", |b| {
        b.iter(|| black_box(pick_tile(&projection, &grid, black_box(point), &config)));
    });
    group.bench_function("flat_inverse", |b| {
        b.iter(|| black_box(projection.screen_to_tile(black_box(point))));
    });
    group.finish();
}

fn bench_placement(c: &mut Criterion) {
    let grid = generate_terrain(&WorldParams::with_seed(3));
    let buildings: Vec<(EntityId, Footprint)> = (0..200)
        .map(|i| {
            let origin = IVec2::new((i % 20) * 6, (i / 20) * 6);
            (EntityId(i as u64), Footprint::new(origin, 2))
        })
        .collect();

    c.bench_function("check_placement_4x4_vs_200", |b| {
        b.iter(|| {
            black_box(check_placement(
                &grid,
                &buildings,
                black_box(100),
                black_box(100),
                4,
                None,
            ))
        });
    });
}

criterion_group!(benches, bench_pick, bench_placement);
criterion_main!(benches);
