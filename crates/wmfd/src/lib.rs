#![doc = include_str!("../README.md")]

mod error;
pub mod features;
pub mod metric;
pub mod newick;
pub mod tree;
mod weights;

pub use error::{ParseError, ParseErrorKind, WeightsError};
pub use features::TreePrecomputation;
pub use metric::{NormalizationScope, RobinsonFoulds, TreeMetric, Wmfd};
pub use tree::Tree;
pub use weights::{Weights, DEFAULT_WEIGHTS};

/// The current version of the crate.
pub const VERSION: &str = "0.1.0";
