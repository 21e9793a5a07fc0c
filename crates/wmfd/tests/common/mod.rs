//! Tree generation utilities for testing.

use rand::prelude::*;
use wmfd::TreePrecomputation;

/// A random binary tree over the given leaf names, with random branch lengths.
pub fn random_newick<R: Rng>(leaves: &[String], rng: &mut R) -> String {
    let mut subtrees = leaves
        .iter()
        .map(|name| format!("{name}:{:.3}", rng.gen_range(0.1..2.0)))
        .collect::<Vec<_>>();

    while subtrees.len() > 1 {
        let i = rng.gen_range(0..subtrees.len());
        let left = subtrees.swap_remove(i);
        let j = rng.gen_range(0..subtrees.len());
        let right = subtrees.swap_remove(j);
        subtrees.push(format!("({left},{right}):{:.3}", rng.gen_range(0.1..2.0)));
    }

    format!("{};", subtrees.pop().unwrap_or_default())
}

/// The names `L0..L{n}`.
pub fn leaf_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("L{i}")).collect()
}

/// `count` random trees over the same `num_leaves` leaves.
pub fn random_trees(count: usize, num_leaves: usize, seed: u64) -> Vec<TreePrecomputation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let names = leaf_names(num_leaves);
    (0..count)
        .map(|_| TreePrecomputation::from_newick(&random_newick(&names, &mut rng)).unwrap())
        .collect()
}

/// `count` random trees, each over a random subset of `num_leaves` leaves.
pub fn random_partial_trees(count: usize, num_leaves: usize, seed: u64) -> Vec<TreePrecomputation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let names = leaf_names(num_leaves);
    (0..count)
        .map(|_| {
            let size = rng.gen_range(2..=num_leaves);
            let subset = names.choose_multiple(&mut rng, size).cloned().collect::<Vec<_>>();
            TreePrecomputation::from_newick(&random_newick(&subset, &mut rng)).unwrap()
        })
        .collect()
}
