//! Partitioning Around Medoids on a precomputed distance matrix.

use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{utils, ClusterError, DistanceMatrix, Result};

/// How the medoids of a restart are first chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Init {
    /// `k` distinct items drawn uniformly at random.
    #[default]
    Random,
    /// The greedy BUILD step for the first restart, random for the others.
    ///
    /// BUILD starts from the item with the smallest sum of distances and then
    /// repeatedly adds the item that most reduces the total distance of every
    /// item to its nearest medoid.
    Build,
}

/// Parameters of the clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PamConfig {
    /// Restart `r` draws its random numbers from a generator seeded with
    /// `seed + r`.
    pub seed: u64,
    /// The number of restarts. The best restart is kept.
    pub n_init: usize,
    /// The maximum number of iterations of each restart.
    pub max_iter: usize,
    /// How restarts are initialized.
    pub init: Init,
}

impl Default for PamConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_init: 10,
            max_iter: 100,
            init: Init::Random,
        }
    }
}

/// The outcome of clustering a matrix into `k` clusters.
///
/// Clusters are numbered `1..=k` in ascending order of the index of their
/// medoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// The cluster of each item, in `1..=k`.
    labels: Vec<usize>,
    /// The medoid of each cluster, in ascending order.
    medoids: Vec<usize>,
    /// The sum of distances from each item to its medoid.
    objective: f64,
    /// The number of iterations of the best restart.
    n_iter: usize,
    /// The number of restarts that were run.
    n_init: usize,
    /// The base seed.
    seed: u64,
    /// Whether the best restart stopped before reaching `max_iter`.
    converged: bool,
    /// The objective after initialization and after every accepted iteration
    /// of the best restart.
    history: Vec<f64>,
}

impl ClusterAssignment {
    /// The number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.medoids.len()
    }

    /// The cluster of each item, in `1..=k`.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The medoid of each cluster. The medoid of cluster `c` is at `c - 1`.
    #[must_use]
    pub fn medoids(&self) -> &[usize] {
        &self.medoids
    }

    /// The sum of distances from each item to the medoid of its cluster.
    #[must_use]
    pub const fn objective(&self) -> f64 {
        self.objective
    }

    /// The number of iterations used by the best restart.
    #[must_use]
    pub const fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// The number of restarts that were run.
    #[must_use]
    pub const fn n_init(&self) -> usize {
        self.n_init
    }

    /// The base seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether the best restart converged before reaching the iteration cap.
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.converged
    }

    /// The objective after initialization and after every accepted iteration.
    #[must_use]
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// The indices of the members of cluster `c`, in ascending order.
    #[must_use]
    pub fn members(&self, c: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == c)
            .map(|(i, _)| i)
            .collect()
    }

    /// The number of members of each cluster.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &l in &self.labels {
            sizes[l - 1] += 1;
        }
        sizes
    }

    /// The `n x k` table of distances from every item to every medoid.
    #[must_use]
    pub fn distances_to_medoids(&self, matrix: &DistanceMatrix) -> Vec<Vec<f64>> {
        (0..matrix.cardinality())
            .map(|i| self.medoids.iter().map(|&m| matrix.get(i, m)).collect())
            .collect()
    }
}

/// The state reached by one restart.
struct Restart {
    /// Medoids in ascending order.
    medoids: Vec<usize>,
    /// Position of each item's medoid in `medoids`.
    nearest: Vec<usize>,
    /// Objective of the final state.
    objective: f64,
    /// Iterations run.
    n_iter: usize,
    /// Whether the restart stopped before the iteration cap.
    converged: bool,
    /// Objective after initialization and after every accepted iteration.
    history: Vec<f64>,
}

/// Assigns every item to its nearest medoid, the lowest-index medoid on ties.
///
/// Returns the position of each item's medoid and the objective.
fn assign(matrix: &DistanceMatrix, medoids: &[usize]) -> (Vec<usize>, f64) {
    let mut objective = 0.0;
    let nearest = (0..matrix.cardinality())
        .map(|i| {
            let distances = medoids.iter().map(|&m| matrix.get(i, m)).collect::<Vec<_>>();
            let (c, d) = utils::arg_min(&distances).unwrap_or((0, 0.0));
            objective += d;
            c
        })
        .collect();
    (nearest, objective)
}

/// The member of each cluster with the smallest sum of distances to the
/// other members. The current medoid is kept on ties, otherwise the member
/// with the lowest index wins.
///
/// Clusters without members get `None`.
fn update(matrix: &DistanceMatrix, medoids: &[usize], nearest: &[usize]) -> Vec<Option<usize>> {
    let mut members = vec![Vec::new(); medoids.len()];
    for (i, &c) in nearest.iter().enumerate() {
        members[c].push(i);
    }

    medoids
        .iter()
        .zip(members)
        .map(|(&current, members)| {
            let cost = |m: usize| members.iter().map(|&j| matrix.get(m, j)).sum::<f64>();
            let costs = members.iter().map(|&m| cost(m)).collect::<Vec<_>>();
            let (best, best_cost) = utils::arg_min(&costs)?;
            if members.contains(&current) && cost(current) <= best_cost {
                Some(current)
            } else {
                Some(members[best])
            }
        })
        .collect()
}

/// Replaces the medoids of empty clusters.
///
/// The replacement is the non-medoid item farthest from its nearest previous
/// medoid. If no such item is farther than 0, an unused item is drawn at
/// random.
fn repair<R: Rng>(matrix: &DistanceMatrix, previous: &[usize], proposed: Vec<Option<usize>>, rng: &mut R) -> Vec<usize> {
    let n = matrix.cardinality();
    let mut chosen = proposed.iter().flatten().copied().collect::<Vec<_>>();

    let (nearest, _) = assign(matrix, previous);
    let gaps = (0..n).map(|i| matrix.get(i, previous[nearest[i]])).collect::<Vec<_>>();

    let mut medoids = Vec::with_capacity(proposed.len());
    for m in proposed {
        let m = m.unwrap_or_else(|| {
            let candidates = (0..n)
                .filter(|i| !chosen.contains(i) && !previous.contains(i))
                .map(|i| (i, gaps[i]))
                .collect::<Vec<_>>();
            let farthest = candidates
                .iter()
                .filter(|&&(_, g)| g > 0.0)
                .fold(None, |best: Option<(usize, f64)>, &(i, g)| match best {
                    Some((_, b)) if b >= g => best,
                    _ => Some((i, g)),
                });
            let m = farthest.map_or_else(
                || {
                    let unused = (0..n).filter(|i| !chosen.contains(i)).collect::<Vec<_>>();
                    unused.choose(&mut *rng).copied().unwrap_or(0)
                },
                |(i, _)| i,
            );
            ftlog::debug!("Repairing an empty cluster with item {m}.");
            m
        });
        chosen.push(m);
        medoids.push(m);
    }

    medoids.sort_unstable();
    medoids.dedup();
    medoids
}

/// Greedy BUILD initialization.
fn build_init(matrix: &DistanceMatrix, k: usize) -> Vec<usize> {
    let n = matrix.cardinality();
    let (first, _) = utils::arg_min(&matrix.row_sums()).unwrap_or((0, 0.0));
    let mut medoids = vec![first];
    let mut gaps = matrix.row(first).to_vec();

    while medoids.len() < k {
        let gains = (0..n)
            .map(|c| {
                if medoids.contains(&c) {
                    f64::NEG_INFINITY
                } else {
                    gaps.iter()
                        .zip(matrix.row(c))
                        .map(|(&g, &d)| (g - d).max(0.0))
                        .sum()
                }
            })
            .collect::<Vec<_>>();
        let (c, _) = utils::arg_max(&gains).unwrap_or((0, 0.0));

        for (g, &d) in gaps.iter_mut().zip(matrix.row(c)) {
            *g = g.min(d);
        }
        medoids.push(c);
    }

    medoids.sort_unstable();
    medoids
}

/// Runs restart `r`.
fn restart(matrix: &DistanceMatrix, k: usize, config: &PamConfig, r: usize) -> Restart {
    let n = matrix.cardinality();
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(r as u64));

    let mut medoids = if r == 0 && config.init == Init::Build {
        build_init(matrix, k)
    } else {
        let mut medoids = rand::seq::index::sample(&mut rng, n, k).into_vec();
        medoids.sort_unstable();
        medoids
    };
    let (mut nearest, mut objective) = assign(matrix, &medoids);
    let mut history = vec![objective];

    let mut n_iter = 0;
    let mut converged = false;
    while n_iter < config.max_iter {
        n_iter += 1;

        let proposed = update(matrix, &medoids, &nearest);
        let candidate = repair(matrix, &medoids, proposed, &mut rng);
        if candidate == medoids || candidate.len() < k {
            converged = true;
            break;
        }

        let (candidate_nearest, candidate_objective) = assign(matrix, &candidate);
        if candidate_objective > objective {
            ftlog::debug!("Restart {r} stopped at iteration {n_iter}: objective would rise to {candidate_objective}.");
            converged = true;
            break;
        }

        medoids = candidate;
        nearest = candidate_nearest;
        objective = candidate_objective;
        history.push(objective);
    }

    Restart {
        medoids,
        nearest,
        objective,
        n_iter,
        converged,
        history,
    }
}

impl PamConfig {
    /// Sets the base seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of restarts.
    #[must_use]
    pub const fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Sets the iteration cap of each restart.
    #[must_use]
    pub const fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the initialization.
    #[must_use]
    pub const fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    /// Checks the parameters against the matrix.
    fn validate(&self, matrix: &DistanceMatrix, k: usize) -> Result<()> {
        let n = matrix.cardinality();
        if n < 2 {
            return Err(ClusterError::invalid(format!("at least 2 items are needed, got {n}")));
        }
        if k == 0 || k >= n {
            return Err(ClusterError::invalid(format!(
                "k must be in [1, {}] for {n} items, got {k}",
                n - 1
            )));
        }
        if self.n_init == 0 {
            return Err(ClusterError::invalid("n_init must be at least 1"));
        }
        Ok(())
    }

    /// The closed form for a single cluster: the medoid is the item with the
    /// smallest sum of distances.
    fn single_cluster(&self, matrix: &DistanceMatrix) -> ClusterAssignment {
        let (medoid, objective) = utils::arg_min(&matrix.row_sums()).unwrap_or((0, 0.0));
        ClusterAssignment {
            labels: vec![1; matrix.cardinality()],
            medoids: vec![medoid],
            objective,
            n_iter: 0,
            n_init: 1,
            seed: self.seed,
            converged: true,
            history: vec![objective],
        }
    }

    /// Keeps the restart with the lowest objective, the earliest on ties.
    fn finish(&self, k: usize, restarts: Vec<Restart>) -> Result<ClusterAssignment> {
        let n_init = restarts.len();
        let best = restarts
            .into_iter()
            .reduce(|best, r| if r.objective < best.objective { r } else { best })
            .ok_or_else(|| ClusterError::invalid("no restarts were run"))?;

        if !best.converged {
            ftlog::warn!(
                "k = {k}: best restart reached max_iter = {} without converging.",
                self.max_iter
            );
        }
        ftlog::debug!("k = {k}: objective {:.6} after {} iterations.", best.objective, best.n_iter);

        Ok(ClusterAssignment {
            labels: best.nearest.iter().map(|&c| c + 1).collect(),
            medoids: best.medoids,
            objective: best.objective,
            n_iter: best.n_iter,
            n_init,
            seed: self.seed,
            converged: best.converged,
            history: best.history,
        })
    }

    /// Clusters the items of the matrix into `k` clusters.
    ///
    /// # Errors
    ///
    /// - If the matrix has fewer than 2 items.
    /// - If `k` is not in `[1, n - 1]`.
    /// - If `n_init` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use treeclust::{DistanceMatrix, PamConfig};
    ///
    /// let ids = ["a", "b", "c", "d"].map(String::from).to_vec();
    /// let rows = vec![
    ///     vec![0.0, 1.0, 5.0, 6.0],
    ///     vec![1.0, 0.0, 5.0, 6.0],
    ///     vec![5.0, 5.0, 0.0, 1.0],
    ///     vec![6.0, 6.0, 1.0, 0.0],
    /// ];
    /// let matrix = DistanceMatrix::from_dense(ids, rows).unwrap();
    ///
    /// let assignment = PamConfig::default().fit(&matrix, 2).unwrap();
    /// assert_eq!(assignment.labels(), &[1, 1, 2, 2]);
    /// assert_eq!(assignment.objective(), 2.0);
    /// ```
    pub fn fit(&self, matrix: &DistanceMatrix, k: usize) -> Result<ClusterAssignment> {
        self.validate(matrix, k)?;
        if k == 1 {
            return Ok(self.single_cluster(matrix));
        }

        let restarts = (0..self.n_init).map(|r| restart(matrix, k, self, r)).collect();
        self.finish(k, restarts)
    }

    /// Parallel version of [`PamConfig::fit`], running restarts in parallel.
    ///
    /// The result is identical to that of the sequential version.
    ///
    /// # Errors
    ///
    /// See [`PamConfig::fit`].
    pub fn par_fit(&self, matrix: &DistanceMatrix, k: usize) -> Result<ClusterAssignment> {
        self.validate(matrix, k)?;
        if k == 1 {
            return Ok(self.single_cluster(matrix));
        }

        let restarts = (0..self.n_init)
            .into_par_iter()
            .map(|r| restart(matrix, k, self, r))
            .collect();
        self.finish(k, restarts)
    }
}

#[cfg(test)]
mod tests {
    use super::{build_init, repair, update};
    use crate::DistanceMatrix;
    use rand::prelude::*;

    fn matrix(rows: Vec<Vec<f64>>) -> DistanceMatrix {
        let ids = (0..rows.len()).map(|i| i.to_string()).collect();
        DistanceMatrix::from_dense(ids, rows).unwrap()
    }

    fn two_pairs() -> DistanceMatrix {
        matrix(vec![
            vec![0.0, 1.0, 5.0, 6.0],
            vec![1.0, 0.0, 5.0, 6.0],
            vec![5.0, 5.0, 0.0, 1.0],
            vec![6.0, 6.0, 1.0, 0.0],
        ])
    }

    #[test]
    fn update_keeps_current_on_ties() {
        let m = two_pairs();
        assert_eq!(update(&m, &[1, 3], &[0, 0, 1, 1]), [Some(1), Some(3)]);
        assert_eq!(update(&m, &[0, 2], &[0, 0, 1, 1]), [Some(0), Some(2)]);
    }

    #[test]
    fn update_reports_empty_clusters() {
        let m = two_pairs();
        assert_eq!(update(&m, &[0, 1, 2], &[0, 0, 2, 2]), [Some(0), None, Some(2)]);
    }

    #[test]
    fn repair_picks_farthest() {
        let m = two_pairs();
        let mut rng = StdRng::seed_from_u64(0);
        // Item 3 is the only item that was never a medoid.
        assert_eq!(repair(&m, &[0, 1, 2], vec![Some(0), None, Some(2)], &mut rng), [0, 2, 3]);
    }

    #[test]
    fn repair_without_spread_is_random() {
        let m = matrix(vec![vec![0.0; 3]; 3]);
        let mut rng = StdRng::seed_from_u64(0);
        let medoids = repair(&m, &[0, 1], vec![Some(0), None], &mut rng);
        assert_eq!(medoids.len(), 2);
        assert!(medoids.contains(&0));
    }

    #[test]
    fn build_init_spreads() {
        let m = two_pairs();
        let medoids = build_init(&m, 2);
        assert_eq!(medoids.len(), 2);
        assert!(medoids[0] < 2 && medoids[1] >= 2);
    }
}
