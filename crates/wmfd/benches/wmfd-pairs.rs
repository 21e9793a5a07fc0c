use criterion::*;
use rand::prelude::*;

use wmfd::{metric::TreeMetric, NormalizationScope, RobinsonFoulds, TreePrecomputation, Weights, Wmfd};

fn random_newick(num_leaves: usize, rng: &mut StdRng) -> String {
    let mut subtrees = (0..num_leaves)
        .map(|i| format!("L{i}@{:.2}:{:.3}", rng.gen_range(0.5..2.0), rng.gen_range(0.1..2.0)))
        .collect::<Vec<_>>();

    while subtrees.len() > 1 {
        let left = subtrees.swap_remove(rng.gen_range(0..subtrees.len()));
        let right = subtrees.swap_remove(rng.gen_range(0..subtrees.len()));
        subtrees.push(format!("({left},{right}):{:.3}", rng.gen_range(0.1..2.0)));
    }

    format!("{};", subtrees.pop().unwrap_or_default())
}

fn tree_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree-pairs");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for num_leaves in [16, 64, 256, 1024] {
        let mut rng = StdRng::seed_from_u64(num_leaves as u64);
        let newick = [random_newick(num_leaves, &mut rng), random_newick(num_leaves, &mut rng)];

        group.bench_with_input(BenchmarkId::new("precompute", num_leaves), &newick[0], |b, n| {
            b.iter_with_large_drop(|| black_box(TreePrecomputation::from_newick(n)));
        });

        let [a, b] = newick.map(|n| TreePrecomputation::from_newick(&n).unwrap_or_else(|e| unreachable!("{e}")));

        let mut global = Wmfd::new(Weights::default(), NormalizationScope::Global);
        global.fit(&[a.clone(), b.clone()]);
        let metrics: [(&str, Box<dyn TreeMetric>); 4] = [
            ("wmfd", Box::new(Wmfd::default())),
            ("wmfd-global", Box::new(global)),
            ("wmfd-raw", Box::new(Wmfd::new(Weights::default(), NormalizationScope::Raw))),
            ("rf", Box::new(RobinsonFoulds)),
        ];

        for (name, metric) in &metrics {
            group.bench_with_input(BenchmarkId::new(*name, num_leaves), &num_leaves, |bench, _| {
                bench.iter(|| black_box(metric.distance(&a, &b)));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, tree_pairs);
criterion_main!(benches);
