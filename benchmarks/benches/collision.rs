//! Collision and playback benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench collision
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench collision -- self_collision

use armsim::collision::{detect_obstacle_collisions, detect_self_collisions, SelfCollisionConfig};
use armsim::geometry::{Obb, Segment};
use armsim_bench::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Quat, Vec3};

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

fn bench_sat(c: &mut Criterion) {
    let mut group = c.benchmark_group("sat/obb_obb");
    let unit = Vec3::splat(-0.5);
    let a = Obb::from_world_transform(unit, -unit, Mat4::IDENTITY).unwrap();

    let rotated = Mat4::from_rotation_translation(
        Quat::from_euler(glam::EulerRot::XYZ, 0.3, 0.7, 0.2),
        Vec3::new(0.9, 0.2, 0.1),
    );
    let hit = Obb::from_world_transform(unit, -unit, rotated).unwrap();
    group.bench_function("intersecting", |b| {
        b.iter(|| black_box(&a).intersects(black_box(&hit)));
    });

    let far = Mat4::from_rotation_translation(
        Quat::from_euler(glam::EulerRot::XYZ, 0.3, 0.7, 0.2),
        Vec3::new(3.0, 0.0, 0.0),
    );
    let miss = Obb::from_world_transform(unit, -unit, far).unwrap();
    group.bench_function("separated", |b| {
        b.iter(|| black_box(&a).intersects(black_box(&miss)));
    });
    group.finish();
}

fn bench_segment_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_distance");
    let s1 = Segment::new(Vec3::ZERO, Vec3::new(1.0, 0.2, 0.0));
    let skew = Segment::new(Vec3::new(0.3, 1.0, -0.5), Vec3::new(0.6, -0.4, 0.5));
    let parallel = Segment::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(1.0, 0.7, 0.0));
    group.bench_function("skew", |b| {
        b.iter(|| black_box(&s1).distance_squared(black_box(&skew)));
    });
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(&s1).distance_squared(black_box(&parallel)));
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

fn bench_obstacle_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("obstacle_detection");
    let robot = posed_robot(6);
    for &n in &[1, 10, 50, 200] {
        let field = setup_obstacles(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let parts = robot.body_part_obbs();
                let obstacles = field.world_obbs();
                detect_obstacle_collisions(&parts, &obstacles, 0.03)
            });
        });
    }
    group.finish();
}

fn bench_self_collision(c: &mut Criterion) {
    let mut group = c.benchmark_group("self_collision");
    let config = SelfCollisionConfig::default();
    for &links in &[6, 12, 24] {
        let robot = posed_robot(links);
        let pivots = robot.pivot_positions();
        let base = Some((Vec3::new(0.0, 0.1, 0.0), 0.24));
        group.bench_with_input(BenchmarkId::from_parameter(links), &links, |b, _| {
            b.iter(|| detect_self_collisions(black_box(&pivots), base, &config));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Full frame
// ---------------------------------------------------------------------------

fn bench_playback_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("playback/frame");
    for &n in &[0, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut sim = setup_playing_simulation(6, n);
            // 20 Hz frames so both detectors run on every iteration.
            b.iter(|| sim.tick(0.05));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sat,
    bench_segment_distance,
    bench_obstacle_detection,
    bench_self_collision,
    bench_playback_frame,
);
criterion_main!(benches);
