//! Errors raised while building matrices and clustering.

use thiserror::Error;
use wmfd::ParseError;

/// The error type of this crate.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A parameter, matrix or labeling that cannot be used.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A tree in a batch could not be parsed.
    #[error("tree {index} ({id}) could not be parsed: {source}")]
    Parse {
        /// Position of the tree in the input batch.
        index: usize,
        /// Identifier of the tree.
        id: String,
        /// What went wrong.
        #[source]
        source: ParseError,
    },
    /// Clustering failed for one candidate number of clusters.
    #[error("clustering with k = {k} failed: {source}")]
    Candidate {
        /// The candidate number of clusters.
        k: usize,
        /// What went wrong.
        #[source]
        source: Box<ClusterError>,
    },
}

impl ClusterError {
    /// Creates an `InvalidParameter` error.
    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter(message.into())
    }
}

/// The result type of this crate.
pub type Result<T> = core::result::Result<T, ClusterError>;
