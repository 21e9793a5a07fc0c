//! The normalized Robinson-Foulds distance.

use crate::TreePrecomputation;

use super::{ParTreeMetric, TreeMetric};

/// The Robinson-Foulds distance, normalized to `[0, 1]`.
///
/// This is the size of the symmetric difference of the two split sets,
/// divided by the total number of splits in both trees. Two trees without any
/// non-trivial splits are at distance 0.
///
/// ```
/// use wmfd::{metric::{RobinsonFoulds, TreeMetric}, TreePrecomputation};
///
/// let a = TreePrecomputation::from_newick("((A,B),(C,D),E);").unwrap();
/// let b = TreePrecomputation::from_newick("((A,B),(C,E),D);").unwrap();
/// assert_eq!(RobinsonFoulds.distance(&a, &b), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RobinsonFoulds;

impl TreeMetric for RobinsonFoulds {
    fn distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
        let (sa, sb) = (a.splits(), b.splits());
        let total = sa.len() + sb.len();
        if total == 0 {
            return 0.0;
        }
        let shared = sa.intersection(sb).count();

        #[allow(clippy::cast_precision_loss)]
        let ratio = (total - 2 * shared) as f64 / total as f64;
        ratio
    }

    fn name(&self) -> &str {
        "robinson-foulds"
    }
}

impl ParTreeMetric for RobinsonFoulds {}
