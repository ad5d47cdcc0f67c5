//! Benchmarks for genome decoding and fitness scoring.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use density_gp::{
    compute::{
        Grid,
        evolution::{EvolutionEngine, GenomeRng, decode, score},
    },
    schema::EvolutionConfig,
};

fn gradient_target(size: usize) -> Grid<u8> {
    Grid::from_fn(size, size, |x, y| ((x + y) * 255 / (2 * size)) as u8)
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let mut rng = GenomeRng::new(7);

    for length in [8, 32, 128] {
        let genome = rng.random_genome(length);
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| decode(black_box(311), black_box(97), black_box(&genome)));
        });
    }

    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");
    let mut rng = GenomeRng::new(11);
    let genome = rng.random_genome(32);

    for size in [64, 128, 256, 512] {
        let target = gradient_target(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, _| {
                b.iter(|| score(black_box(&genome), black_box(&target)));
            },
        );
    }

    group.finish();
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle");
    group.sample_size(10);

    for size in [128, 512] {
        let config = EvolutionConfig {
            random_seed: Some(42),
            ..Default::default()
        };
        let mut engine = match EvolutionEngine::new(config, gradient_target(size)) {
            Ok(engine) => engine,
            Err(e) => panic!("invalid benchmark config: {e}"),
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, _| {
                b.iter(|| black_box(engine.cycle()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_score, bench_cycle);
criterion_main!(benches);
