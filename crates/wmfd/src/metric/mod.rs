//! The `TreeMetric` trait is used for all pairwise tree comparisons.

mod robinson_foulds;
mod wmfd;

pub use robinson_foulds::RobinsonFoulds;
pub use wmfd::{ChannelRanges, NormalizationScope, Wmfd, WmfdBreakdown};

use crate::TreePrecomputation;

/// A dissimilarity between two precomputed trees.
///
/// Implementors must be pure: `distance` may be called concurrently on the
/// same inputs and must always return the same value.
///
/// # Example
///
/// A metric that only counts leaves present in one tree but not the other.
///
/// ```rust
/// use wmfd::{metric::TreeMetric, TreePrecomputation};
///
/// struct LeafSymmetricDifference;
///
/// impl TreeMetric for LeafSymmetricDifference {
///     fn distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
///         let only_a = a.leaf_names().filter(|&x| !b.contains_leaf(x)).count();
///         let only_b = b.leaf_names().filter(|&x| !a.contains_leaf(x)).count();
///         (only_a + only_b) as f64
///     }
///
///     fn name(&self) -> &str {
///         "leaf-symmetric-difference"
///     }
/// }
///
/// let a = TreePrecomputation::from_newick("(A,B,C);").unwrap();
/// let b = TreePrecomputation::from_newick("(A,B,D);").unwrap();
/// assert_eq!(LeafSymmetricDifference.distance(&a, &b), 2.0);
/// ```
pub trait TreeMetric {
    /// Calls the metric on two trees.
    fn distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64;

    /// The name of the metric.
    fn name(&self) -> &str;

    /// Prepares the metric for a batch of trees before any pairwise call.
    ///
    /// Metrics whose values depend on the whole batch, such as WMFD with
    /// [`NormalizationScope::Global`], use this to collect corpus statistics.
    /// The default implementation does nothing.
    fn fit(&mut self, corpus: &[TreePrecomputation]) {
        let _ = corpus;
    }
}

/// Parallel version of [`TreeMetric`].
#[allow(clippy::module_name_repetitions)]
pub trait ParTreeMetric: TreeMetric + Send + Sync {
    /// Parallel version of [`TreeMetric::distance`].
    ///
    /// The default implementation calls the non-parallel version of the
    /// distance function.
    fn par_distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
        self.distance(a, b)
    }
}

impl TreeMetric for Box<dyn TreeMetric> {
    fn distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
        (**self).distance(a, b)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn fit(&mut self, corpus: &[TreePrecomputation]) {
        (**self).fit(corpus);
    }
}

impl TreeMetric for Box<dyn ParTreeMetric> {
    fn distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
        (**self).distance(a, b)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn fit(&mut self, corpus: &[TreePrecomputation]) {
        (**self).fit(corpus);
    }
}

impl ParTreeMetric for Box<dyn ParTreeMetric> {
    fn par_distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
        (**self).par_distance(a, b)
    }
}
