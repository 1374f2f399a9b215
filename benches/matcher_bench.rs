use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use schemgen::{
    place, BlockIdentifier, ColorIndex, ColorMatcher, ReferenceTexture, SchemConfig, VoxelGrid,
};
use std::sync::Arc;
use std::time::Duration;

fn make_index(entries: usize) -> ColorIndex {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let textures = (0..entries).map(|i| ReferenceTexture {
        block: BlockIdentifier::new(format!("minecraft:block_{}", i)),
        width: 4,
        height: 4,
        pixels: (0..16)
            .flat_map(|_| [rng.gen::<u8>(), rng.gen(), rng.gen(), 255])
            .collect(),
        full_cube: true,
    });
    ColorIndex::build(textures.collect::<Vec<_>>())
}

fn make_grid(side: usize, fill_pct: f64) -> VoxelGrid {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut grid = VoxelGrid::empty(side).unwrap();
    for x in 0..side {
        for y in 0..side {
            for z in 0..side {
                if rng.gen_bool(fill_pct) {
                    grid.set(x, y, z, [rng.gen(), rng.gen(), rng.gen()]);
                }
            }
        }
    }
    grid
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("color_index");
    for &entries in &[100usize, 1000] {
        let index = Arc::new(make_index(entries));
        let matcher = ColorMatcher::new(Arc::clone(&index));
        group.bench_with_input(BenchmarkId::new("build", entries), &entries, |b, &n| {
            b.iter(|| make_index(black_box(n)))
        });
        group.bench_with_input(BenchmarkId::new("match", entries), &matcher, |b, m| {
            b.iter(|| m.match_color(black_box([0.3, 0.6, 0.2]), 1.0).unwrap())
        });
    }
    group.finish();
}

fn bench_place(c: &mut Criterion) {
    let mut group = c.benchmark_group("place");
    group.measurement_time(Duration::from_secs(5));
    let matcher = ColorMatcher::new(Arc::new(make_index(800)));
    let config = SchemConfig::default();

    for &pct in &[0.1, 0.5] {
        let grid = make_grid(32, pct);
        let label = format!("32³_{}pct", (pct * 100.0) as u32);
        group.bench_with_input(BenchmarkId::new("place", &label), &grid, |b, g| {
            b.iter(|| place(black_box(g), &matcher, &config).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index, bench_place);
criterion_main!(benches);
