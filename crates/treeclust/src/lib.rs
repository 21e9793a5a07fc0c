#![doc = include_str!("../README.md")]

mod error;
pub mod evaluation;
pub mod matrix;
mod pam;
pub mod report;
pub mod selection;
pub mod utils;

pub use error::{ClusterError, Result};
pub use matrix::{DistanceMatrix, MatrixBuilder, MatrixSummary, SkippedTree};
pub use pam::{ClusterAssignment, Init, PamConfig};
pub use selection::{CandidateScores, ModelSelectionResult, SelectionConfig, ValidityScores};

/// The current version of the crate.
pub const VERSION: &str = "0.1.0";
