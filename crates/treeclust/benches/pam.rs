use criterion::*;
use rand::prelude::*;

use treeclust::{DistanceMatrix, Init, PamConfig, SelectionConfig};

fn line_groups(num_groups: usize, group_size: usize, seed: u64) -> DistanceMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..num_groups * group_size)
        .map(|i| 100.0 * (i / group_size) as f64 + rng.gen_range(0.0..10.0))
        .collect::<Vec<_>>();

    let ids = (0..points.len()).map(|i| format!("t{i}")).collect();
    let rows = points
        .iter()
        .map(|a| points.iter().map(|b| (a - b).abs()).collect())
        .collect();
    DistanceMatrix::from_dense(ids, rows).unwrap_or_else(|e| unreachable!("{e}"))
}

fn pam(c: &mut Criterion) {
    let mut group = c.benchmark_group("pam");
    group.sample_size(10);

    for n in [100, 400, 1600] {
        let matrix = line_groups(4, n / 4, 42);

        for (name, init) in [("random", Init::Random), ("build", Init::Build)] {
            let config = PamConfig::default().with_init(init);
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter(|| black_box(config.fit(&matrix, 4)));
            });
            group.bench_with_input(BenchmarkId::new(format!("par-{name}"), n), &n, |b, _| {
                b.iter(|| black_box(config.par_fit(&matrix, 4)));
            });
        }
    }

    group.finish();
}

fn selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(10);

    let config = SelectionConfig::default().with_range(2, 8);
    for n in [100, 400] {
        let matrix = line_groups(4, n / 4, 7);
        group.bench_with_input(BenchmarkId::new("select", n), &n, |b, _| {
            b.iter(|| black_box(config.select(&matrix)));
        });
        group.bench_with_input(BenchmarkId::new("par_select", n), &n, |b, _| {
            b.iter(|| black_box(config.par_select(&matrix)));
        });
    }

    group.finish();
}

criterion_group!(benches, pam, selection);
criterion_main!(benches);
