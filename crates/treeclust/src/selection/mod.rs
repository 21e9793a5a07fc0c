//! Choosing the number of clusters.

mod scores;

use core::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{utils, ClusterAssignment, ClusterError, DistanceMatrix, PamConfig, Result};

pub use scores::{calinski_harabasz, davies_bouldin, silhouette, ValidityScores};

/// The range of candidate cluster counts and the clustering parameters used
/// for each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// The smallest candidate.
    pub k_min: usize,
    /// The largest candidate.
    pub k_max: usize,
    /// Parameters of every clustering.
    pub pam: PamConfig,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            k_min: 2,
            k_max: 10,
            pam: PamConfig::default(),
        }
    }
}

/// The clustering and scores obtained for one candidate `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScores {
    /// The number of clusters.
    pub k: usize,
    /// The validity scores of the clustering.
    pub scores: ValidityScores,
    /// The clustering.
    pub assignment: ClusterAssignment,
}

impl CandidateScores {
    /// Ranks candidates by higher silhouette, then higher Calinski-Harabasz,
    /// then lower Davies-Bouldin, then smaller `k`. NaN ranks last in every
    /// score.
    #[must_use]
    pub fn rank(&self, other: &Self) -> Ordering {
        utils::descending_nan_last(self.scores.silhouette, other.scores.silhouette)
            .then_with(|| utils::descending_nan_last(self.scores.calinski_harabasz, other.scores.calinski_harabasz))
            .then_with(|| utils::ascending_nan_last(self.scores.davies_bouldin, other.scores.davies_bouldin))
            .then_with(|| self.k.cmp(&other.k))
    }
}

/// The chosen number of clusters and the scores of every candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelectionResult {
    /// Every candidate, in ascending order of `k`.
    candidates: Vec<CandidateScores>,
    /// Position of the chosen candidate.
    best: usize,
}

impl ModelSelectionResult {
    /// The chosen number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.best().k
    }

    /// The chosen candidate.
    #[must_use]
    pub fn best(&self) -> &CandidateScores {
        &self.candidates[self.best]
    }

    /// The clustering of the chosen candidate.
    #[must_use]
    pub fn assignment(&self) -> &ClusterAssignment {
        &self.best().assignment
    }

    /// Every candidate, in ascending order of `k`.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateScores] {
        &self.candidates
    }

    /// Every candidate, best first.
    #[must_use]
    pub fn ranked(&self) -> Vec<&CandidateScores> {
        let mut ranked = self.candidates.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| a.rank(b));
        ranked
    }
}

impl SelectionConfig {
    /// Sets the range of candidates.
    #[must_use]
    pub const fn with_range(mut self, k_min: usize, k_max: usize) -> Self {
        self.k_min = k_min;
        self.k_max = k_max;
        self
    }

    /// Sets the clustering parameters.
    #[must_use]
    pub const fn with_pam(mut self, pam: PamConfig) -> Self {
        self.pam = pam;
        self
    }

    /// The candidates `k_min..=min(k_max, n - 1)` for `n` items.
    #[must_use]
    pub fn candidates(&self, n: usize) -> Vec<usize> {
        (self.k_min..=self.k_max.min(n.saturating_sub(1))).collect()
    }

    /// Clusters the matrix with every candidate in the range and picks the best.
    ///
    /// # Errors
    ///
    /// See [`select`].
    pub fn select(&self, matrix: &DistanceMatrix) -> Result<ModelSelectionResult> {
        select(matrix, &self.candidates(matrix.cardinality()), &self.pam)
    }

    /// Parallel version of [`SelectionConfig::select`].
    ///
    /// # Errors
    ///
    /// See [`select`].
    pub fn par_select(&self, matrix: &DistanceMatrix) -> Result<ModelSelectionResult> {
        par_select(matrix, &self.candidates(matrix.cardinality()), &self.pam)
    }
}

/// Sorts and de-duplicates the candidates and drops those outside `[1, n - 1]`.
fn valid_candidates(matrix: &DistanceMatrix, ks: &[usize]) -> Result<Vec<usize>> {
    let n = matrix.cardinality();
    let mut valid = ks.to_vec();
    valid.sort_unstable();
    valid.dedup();
    valid.retain(|&k| {
        let ok = 1 <= k && k < n;
        if !ok {
            ftlog::warn!("Skipping k = {k}: must be in [1, {}] for {n} items.", n.saturating_sub(1));
        }
        ok
    });

    if valid.is_empty() {
        Err(ClusterError::invalid(format!("no valid candidate k among {ks:?} for {n} items")))
    } else {
        Ok(valid)
    }
}

/// Scores one clustering, attaching the candidate to any error.
fn score(matrix: &DistanceMatrix, k: usize, assignment: Result<ClusterAssignment>) -> Result<CandidateScores> {
    let assignment = assignment.map_err(|e| ClusterError::Candidate { k, source: Box::new(e) })?;
    let scores = ValidityScores::new(matrix, &assignment);
    ftlog::info!(
        "k = {k}: objective {:.6}, silhouette {:.6}, CH {:.6}, DB {:.6}",
        assignment.objective(),
        scores.silhouette,
        scores.calinski_harabasz,
        scores.davies_bouldin
    );
    Ok(CandidateScores { k, scores, assignment })
}

/// Picks the best candidate.
fn choose(candidates: Vec<CandidateScores>) -> Result<ModelSelectionResult> {
    let best = candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.rank(b))
        .map(|(i, _)| i)
        .ok_or_else(|| ClusterError::invalid("no candidates were scored"))?;
    ftlog::info!("Selected k = {}.", candidates[best].k);
    Ok(ModelSelectionResult { candidates, best })
}

/// Clusters the matrix with each candidate `k` and picks the best by
/// silhouette, then Calinski-Harabasz, then Davies-Bouldin, then smaller `k`.
///
/// Candidates outside `[1, n - 1]` are skipped with a warning.
///
/// # Errors
///
/// - If no candidate is in `[1, n - 1]`.
/// - If clustering fails for any candidate. The error names the candidate.
///
/// # Examples
///
/// ```
/// use treeclust::{selection::select, DistanceMatrix, PamConfig};
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
/// let result = select(&matrix, &[2, 3], &PamConfig::default()).unwrap();
/// assert_eq!(result.k(), 2);
/// assert_eq!(result.candidates().len(), 2);
/// ```
pub fn select(matrix: &DistanceMatrix, ks: &[usize], pam: &PamConfig) -> Result<ModelSelectionResult> {
    let candidates = valid_candidates(matrix, ks)?
        .into_iter()
        .map(|k| score(matrix, k, pam.fit(matrix, k)))
        .collect::<Result<Vec<_>>>()?;
    choose(candidates)
}

/// Parallel version of [`select`], running candidates and their restarts in
/// parallel.
///
/// The result is identical to that of the sequential version.
///
/// # Errors
///
/// See [`select`].
pub fn par_select(matrix: &DistanceMatrix, ks: &[usize], pam: &PamConfig) -> Result<ModelSelectionResult> {
    let candidates = valid_candidates(matrix, ks)?
        .into_par_iter()
        .map(|k| score(matrix, k, pam.par_fit(matrix, k)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    choose(candidates)
}
