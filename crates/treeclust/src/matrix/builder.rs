//! Building a `DistanceMatrix` from a batch of trees.

use rayon::prelude::*;
use wmfd::{
    metric::{ParTreeMetric, TreeMetric},
    ParseError, TreePrecomputation,
};

use crate::{ClusterError, Result};

use super::DistanceMatrix;

/// A tree that was left out of a lenient batch because it could not be parsed.
#[derive(Debug, Clone)]
pub struct SkippedTree {
    /// Position of the tree in the input batch.
    pub index: usize,
    /// Identifier of the tree.
    pub id: String,
    /// Why the tree could not be parsed.
    pub error: ParseError,
}

/// Collects trees and computes all pairwise distances between them.
///
/// Every tree is parsed and precomputed exactly once, when it is added. The
/// precomputations live only as long as the builder, which is consumed when
/// the matrix is built.
///
/// # Examples
///
/// ```
/// use treeclust::MatrixBuilder;
/// use wmfd::Wmfd;
///
/// let mut builder = MatrixBuilder::default();
/// builder.push_newick("t1", "((A:1,B:1):1,C:2);").unwrap();
/// builder.push_newick("t2", "((A:1,C:1):1,B:2);").unwrap();
/// builder.push_newick("t3", "((A:1,B:1):1,C:2);").unwrap();
///
/// let matrix = builder.build(Wmfd::default()).unwrap();
/// assert_eq!(matrix.cardinality(), 3);
/// assert_eq!(matrix.get(0, 2), 0.0);
/// assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    /// Identifiers of the accepted trees.
    ids: Vec<String>,
    /// Precomputations of the accepted trees.
    trees: Vec<TreePrecomputation>,
    /// Trees left out in lenient mode.
    skipped: Vec<SkippedTree>,
    /// Whether unparseable trees are skipped instead of failing the batch.
    lenient: bool,
}

impl MatrixBuilder {
    /// Creates an empty builder that fails on the first unparseable tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether unparseable trees are skipped and reported instead of
    /// failing the batch.
    #[must_use]
    pub const fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// The number of trees offered so far, accepted or skipped.
    fn num_seen(&self) -> usize {
        self.trees.len() + self.skipped.len()
    }

    /// Parses a tree and adds it to the batch.
    ///
    /// # Errors
    ///
    /// If the tree cannot be parsed and the builder is not lenient. The error
    /// carries the position of the tree in the batch and its id.
    pub fn push_newick<S: Into<String>>(&mut self, id: S, newick: &str) -> Result<()> {
        let parsed = TreePrecomputation::from_newick(newick);
        self.accept(id.into(), parsed)
    }

    /// Adds an already precomputed tree to the batch.
    pub fn push_precomputed<S: Into<String>>(&mut self, id: S, tree: TreePrecomputation) {
        self.ids.push(id.into());
        self.trees.push(tree);
    }

    /// Parses and adds every `(id, newick)` pair in order.
    ///
    /// # Errors
    ///
    /// See [`MatrixBuilder::push_newick`].
    pub fn extend_newick<I, S, N>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: AsRef<str>,
    {
        items
            .into_iter()
            .try_for_each(|(id, newick)| self.push_newick(id, newick.as_ref()))
    }

    /// Parallel version of [`MatrixBuilder::extend_newick`].
    ///
    /// Trees are parsed in parallel and added in their input order.
    ///
    /// # Errors
    ///
    /// See [`MatrixBuilder::push_newick`].
    pub fn par_extend_newick<S, N>(&mut self, items: &[(S, N)]) -> Result<()>
    where
        S: AsRef<str> + Sync,
        N: AsRef<str> + Sync,
    {
        let parsed = items
            .par_iter()
            .map(|(_, newick)| TreePrecomputation::from_newick(newick.as_ref()))
            .collect::<Vec<_>>();

        items
            .iter()
            .zip(parsed)
            .try_for_each(|((id, _), tree)| self.accept(id.as_ref().to_string(), tree))
    }

    /// Adds a parsed tree, or handles its parse error.
    fn accept(&mut self, id: String, parsed: core::result::Result<TreePrecomputation, ParseError>) -> Result<()> {
        let index = self.num_seen();
        match parsed {
            Ok(tree) => {
                self.push_precomputed(id, tree);
                Ok(())
            }
            Err(error) if self.lenient => {
                ftlog::warn!("Skipping tree {index} ({id}): {error}");
                self.skipped.push(SkippedTree { index, id, error });
                Ok(())
            }
            Err(source) => Err(ClusterError::Parse { index, id, source }),
        }
    }

    /// The number of accepted trees.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.trees.len()
    }

    /// The identifiers of the accepted trees.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The precomputations of the accepted trees.
    #[must_use]
    pub fn trees(&self) -> &[TreePrecomputation] {
        &self.trees
    }

    /// The trees that were skipped in lenient mode.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedTree] {
        &self.skipped
    }

    /// Fits the metric on the batch and logs what is about to be computed.
    fn prepare<M: TreeMetric>(&self, metric: &mut M) {
        let n = self.cardinality();
        if !self.skipped.is_empty() {
            ftlog::warn!("{} of {} trees were skipped.", self.skipped.len(), self.num_seen());
        }
        metric.fit(&self.trees);
        ftlog::info!(
            "Computing {} distances between {n} trees with {}...",
            n * n.saturating_sub(1) / 2,
            metric.name()
        );
    }

    /// The pairs `(i, j)` with `i < j`, in row-major order.
    fn pairs(&self) -> impl Iterator<Item = (usize, usize)> {
        let n = self.cardinality();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
    }

    /// Computes the distance matrix.
    ///
    /// The metric is first fitted on the whole batch. Each unordered pair is
    /// evaluated once and mirrored, and the diagonal is zero without calling
    /// the metric.
    ///
    /// # Errors
    ///
    /// If the metric returns a negative, infinite or NaN distance. The error
    /// names the pair.
    pub fn build<M: TreeMetric>(self, mut metric: M) -> Result<DistanceMatrix> {
        self.prepare(&mut metric);

        let upper = self
            .pairs()
            .map(|(i, j)| metric.distance(&self.trees[i], &self.trees[j]))
            .collect::<Vec<_>>();

        self.finish(&upper)
    }

    /// Parallel version of [`MatrixBuilder::build`].
    ///
    /// The result is identical to that of the sequential version.
    ///
    /// # Errors
    ///
    /// See [`MatrixBuilder::build`].
    pub fn par_build<M: ParTreeMetric>(self, mut metric: M) -> Result<DistanceMatrix> {
        self.prepare(&mut metric);

        let pairs = self.pairs().collect::<Vec<_>>();
        let upper = pairs
            .into_par_iter()
            .map(|(i, j)| metric.par_distance(&self.trees[i], &self.trees[j]))
            .collect::<Vec<_>>();

        self.finish(&upper)
    }

    /// Assembles the matrix and drops the precomputations.
    fn finish(self, upper: &[f64]) -> Result<DistanceMatrix> {
        let matrix = DistanceMatrix::from_upper(self.ids, upper)?;
        if let Some(s) = matrix.summary() {
            ftlog::info!(
                "Built {n}x{n} distance matrix: min {:.6}, max {:.6}, mean {:.6}.",
                s.min,
                s.max,
                s.mean,
                n = matrix.cardinality()
            );
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::MatrixBuilder;
    use crate::ClusterError;

    #[test]
    fn lenient_skips() {
        let mut builder = MatrixBuilder::new().lenient(true);
        builder
            .extend_newick([("a", "(A,B);"), ("bad", "((A,B);"), ("c", "(A,C);")])
            .unwrap();

        assert_eq!(builder.ids(), ["a", "c"]);
        assert_eq!(builder.skipped().len(), 1);
        assert_eq!(builder.skipped()[0].index, 1);
        assert_eq!(builder.skipped()[0].id, "bad");
    }

    #[test]
    fn strict_fails_with_context() {
        let mut builder = MatrixBuilder::new();
        let err = builder
            .extend_newick([("a", "(A,B);"), ("b", "(A,C);"), ("bad", "(A,B)")])
            .unwrap_err();

        match err {
            ClusterError::Parse { index, id, .. } => {
                assert_eq!(index, 2);
                assert_eq!(id, "bad");
            }
            other => unreachable!("unexpected error: {other}"),
        }
    }
}
