use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use softblob::*;
use std::hint::black_box;

const DT: f32 = 1.0 / 60.0;

fn prepare_world(blob_count: usize, vertex_count: usize) -> (SoftBodyWorld, SimulationConfig) {
    let config = SimulationConfig::new();
    let mut world = SoftBodyWorld::new(DT);
    let geometry = BlobGeometry::new(60.0, 84.0, vertex_count).expect("valid geometry");
    for i in 0..blob_count {
        let center = Vec2::new(200.0 + (i % 4) as f32 * 200.0, 150.0 + (i / 4) as f32 * 200.0);
        world.spawn_blob(center, geometry, &config).expect("spawn");
    }
    for i in 0..8 {
        let position = Vec2::new(100.0 + i as f32 * 110.0, 700.0);
        world.add_obstacle(Obstacle::circle(position, 30.0, &config));
    }
    (world, config)
}

fn bench_world_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    for &blobs in &[1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("sequential", blobs), &blobs, |b, &blobs| {
            let (mut world, config) = prepare_world(blobs, 80);
            world.set_parallel_enabled(false);
            let pointer = PointerState::default();
            b.iter(|| world.tick(black_box(&config), &pointer))
        });
        group.bench_with_input(BenchmarkId::new("parallel", blobs), &blobs, |b, &blobs| {
            let (mut world, config) = prepare_world(blobs, 80);
            world.set_parallel_enabled(true);
            let pointer = PointerState::default();
            b.iter(|| world.tick(black_box(&config), &pointer))
        });
    }
    group.finish();
}

fn bench_vertex_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_count");
    for &vertices in &[20usize, 80, 160] {
        group.bench_with_input(BenchmarkId::from_parameter(vertices), &vertices, |b, &vertices| {
            let (mut world, config) = prepare_world(1, vertices);
            let pointer = PointerState::default();
            b.iter(|| world.tick(black_box(&config), &pointer))
        });
    }
    group.finish();
}

fn bench_sdf_query(c: &mut Criterion) {
    let (world, _) = prepare_world(0, 80);
    let field = SignedDistanceField::from_obstacles(&world.obstacles);
    c.bench_function("sdf_distance", |b| {
        b.iter(|| field.distance(black_box(Vec2::new(420.0, 640.0))))
    });
}

criterion_group!(benches, bench_world_tick, bench_vertex_count, bench_sdf_query);
criterion_main!(benches);
