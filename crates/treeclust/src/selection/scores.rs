//! Internal validity scores computed from distances alone.

use serde::{Deserialize, Serialize};

use crate::{utils, ClusterAssignment, DistanceMatrix};

/// Silhouette, Calinski-Harabasz and Davies-Bouldin scores of a clustering.
///
/// Higher silhouette and Calinski-Harabasz scores and lower Davies-Bouldin
/// scores are better. A score that is undefined for the clustering is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidityScores {
    /// Mean silhouette width.
    pub silhouette: f64,
    /// Ratio of between-cluster to within-cluster dispersion, about medoids.
    pub calinski_harabasz: f64,
    /// Mean worst-case ratio of cluster spread to medoid separation.
    pub davies_bouldin: f64,
}

impl ValidityScores {
    /// Computes all three scores.
    #[must_use]
    pub fn new(matrix: &DistanceMatrix, assignment: &ClusterAssignment) -> Self {
        Self {
            silhouette: silhouette(matrix, assignment.labels()),
            calinski_harabasz: calinski_harabasz(matrix, assignment),
            davies_bouldin: davies_bouldin(matrix, assignment),
        }
    }
}

/// Groups item indices by label, dropping labels with no items.
fn clusters(labels: &[usize]) -> Vec<Vec<usize>> {
    let k = labels.iter().copied().max().unwrap_or(0);
    let mut clusters = vec![Vec::new(); k + 1];
    for (i, &l) in labels.iter().enumerate() {
        clusters[l].push(i);
    }
    clusters.retain(|c| !c.is_empty());
    clusters
}

/// The mean distance from `i` to the items of `cluster`, leaving out `i`.
#[allow(clippy::cast_precision_loss)]
fn mean_distance(matrix: &DistanceMatrix, i: usize, cluster: &[usize]) -> f64 {
    let (sum, count) = cluster
        .iter()
        .filter(|&&j| j != i)
        .fold((0.0, 0_usize), |(s, c), &j| (s + matrix.get(i, j), c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// The mean silhouette width over all items.
///
/// Items in singleton clusters have a silhouette of 0. The result is NaN with
/// fewer than two non-empty clusters.
#[must_use]
pub fn silhouette(matrix: &DistanceMatrix, labels: &[usize]) -> f64 {
    let clusters = clusters(labels);
    if clusters.len() < 2 {
        return f64::NAN;
    }

    let total = clusters
        .iter()
        .enumerate()
        .flat_map(|(c, members)| members.iter().map(move |&i| (c, i)))
        .map(|(c, i)| {
            if clusters[c].len() == 1 {
                return 0.0;
            }
            let a = mean_distance(matrix, i, &clusters[c]);
            let b = clusters
                .iter()
                .enumerate()
                .filter(|&(o, _)| o != c)
                .map(|(_, other)| mean_distance(matrix, i, other))
                .fold(f64::INFINITY, f64::min);
            let scale = a.max(b);
            if scale > 0.0 {
                (b - a) / scale
            } else {
                0.0
            }
        })
        .sum::<f64>();

    #[allow(clippy::cast_precision_loss)]
    let n = labels.len() as f64;
    total / n
}

/// The Calinski-Harabasz analogue for medoids.
///
/// Dispersions are sums of squared distances: within clusters to their
/// medoids, and in total to the item with the smallest sum of distances. The
/// result is NaN with fewer than two non-empty clusters or no more items than
/// clusters. It is infinite when every item is on its medoid but the total
/// dispersion is positive, and 0 when both dispersions are 0.
#[must_use]
pub fn calinski_harabasz(matrix: &DistanceMatrix, assignment: &ClusterAssignment) -> f64 {
    let n = matrix.cardinality();
    let k = clusters(assignment.labels()).len();
    if k < 2 || n <= k {
        return f64::NAN;
    }

    let medoids = assignment.medoids();
    let within = assignment
        .labels()
        .iter()
        .enumerate()
        .map(|(i, &l)| matrix.get(i, medoids[l - 1]).powi(2))
        .sum::<f64>();

    let (g, _) = utils::arg_min(&matrix.row_sums()).unwrap_or((0, 0.0));
    let total = matrix.row(g).iter().map(|d| d.powi(2)).sum::<f64>();
    let between = (total - within).max(0.0);

    if within > 0.0 {
        #[allow(clippy::cast_precision_loss)]
        let (k, n) = (k as f64, n as f64);
        (between / (k - 1.0)) / (within / (n - k))
    } else if between > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// The Davies-Bouldin analogue for medoids.
///
/// The spread of a cluster is the mean distance of its members to its medoid
/// and the separation of two clusters is the distance between their medoids.
/// A zero separation gives an infinite ratio unless both spreads are 0. The
/// result is NaN with fewer than two non-empty clusters.
#[must_use]
pub fn davies_bouldin(matrix: &DistanceMatrix, assignment: &ClusterAssignment) -> f64 {
    let medoids = assignment.medoids();
    let clusters = (1..=assignment.k())
        .map(|c| (medoids[c - 1], assignment.members(c)))
        .filter(|(_, members)| !members.is_empty())
        .collect::<Vec<_>>();
    if clusters.len() < 2 {
        return f64::NAN;
    }

    #[allow(clippy::cast_precision_loss)]
    let spreads = clusters
        .iter()
        .map(|(m, members)| members.iter().map(|&i| matrix.get(i, *m)).sum::<f64>() / members.len() as f64)
        .collect::<Vec<_>>();

    let worst = clusters
        .iter()
        .enumerate()
        .map(|(i, (mi, _))| {
            clusters
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, (mj, _))| {
                    let spread = spreads[i] + spreads[j];
                    let separation = matrix.get(*mi, *mj);
                    if separation > 0.0 {
                        spread / separation
                    } else if spread > 0.0 {
                        f64::INFINITY
                    } else {
                        0.0
                    }
                })
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .sum::<f64>();

    #[allow(clippy::cast_precision_loss)]
    let k = clusters.len() as f64;
    worst / k
}
