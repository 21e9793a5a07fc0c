//! Data generation utilities for testing.

use rand::prelude::*;
use treeclust::DistanceMatrix;

pub fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("t{i}")).collect()
}

/// Two tight pairs, far from each other.
pub fn two_pairs() -> DistanceMatrix {
    let rows = vec![
        vec![0.0, 1.0, 5.0, 6.0],
        vec![1.0, 0.0, 5.0, 6.0],
        vec![5.0, 5.0, 0.0, 1.0],
        vec![6.0, 6.0, 1.0, 0.0],
    ];
    DistanceMatrix::from_dense(ids(4), rows).unwrap()
}

/// Points on a line in well-separated groups, with their group labels in
/// `1..=num_groups`.
pub fn line_groups(num_groups: usize, group_size: usize, seed: u64) -> (DistanceMatrix, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (points, labels): (Vec<f64>, Vec<usize>) = (0..num_groups)
        .flat_map(|g| (0..group_size).map(move |_| g))
        .map(|g| (100.0 * g as f64 + rng.gen_range(0.0..10.0), g + 1))
        .unzip();

    let rows = points
        .iter()
        .map(|a| points.iter().map(|b| (a - b).abs()).collect())
        .collect();
    (DistanceMatrix::from_dense(ids(points.len()), rows).unwrap(), labels)
}

/// Newick strings drawn around two topologies over the same leaves, with the
/// index of the topology each was drawn from.
pub fn two_topologies(per_topology: usize, seed: u64) -> Vec<(String, String, usize)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let shapes = ["((A:{},B:{}):1,((C:{},D:{}):1,E:{}):1);", "((A:{},C:{}):1,((B:{},E:{}):1,D:{}):1);"];

    (0..2 * per_topology)
        .map(|i| {
            let shape = i % 2;
            let mut newick = shapes[shape].to_string();
            while newick.contains("{}") {
                let length = format!("{:.2}", rng.gen_range(0.9..1.1));
                newick = newick.replacen("{}", &length, 1);
            }
            (format!("tree{i}"), newick, shape + 1)
        })
        .collect()
}
