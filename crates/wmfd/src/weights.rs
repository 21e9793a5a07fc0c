//! The five channel weights `λ1..λ5` of WMFD.

use serde::{Deserialize, Serialize};

use crate::{error::WeightsError, features::Channel};

/// The weights used when none are given, or when the given ones sum to zero.
///
/// In order: branch length, height, weight, degree, topology.
pub const DEFAULT_WEIGHTS: [f64; 5] = [0.30, 0.20, 0.25, 0.15, 0.10];

/// Channel weights, always normalized to sum to 1.
///
/// The first four weights apply to the leaf-level channels in the order of
/// [`Channel::ALL`]; the fifth applies to the topological (split) term.
///
/// # Examples
///
/// ```
/// use wmfd::Weights;
///
/// let weights = Weights::new([2.0, 2.0, 2.0, 2.0, 2.0]).unwrap();
/// assert_eq!(weights.lambdas(), [0.2; 5]);
///
/// // All-zero weights fall back to the defaults.
/// let weights = Weights::new([0.0; 5]).unwrap();
/// assert_eq!(weights, Weights::default());
///
/// assert!(Weights::new([-1.0, 1.0, 1.0, 1.0, 1.0]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 5]", into = "[f64; 5]")]
pub struct Weights([f64; 5]);

impl Default for Weights {
    fn default() -> Self {
        Self(DEFAULT_WEIGHTS)
    }
}

impl Weights {
    /// Validates and normalizes the given weights.
    ///
    /// If the weights sum to zero, the defaults are used instead. Weights too
    /// large to sum are scaled down first.
    ///
    /// # Errors
    ///
    /// If any weight is negative, infinite or NaN.
    pub fn new(lambdas: [f64; 5]) -> Result<Self, WeightsError> {
        if let Some((i, &value)) = lambdas.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0) {
            return Err(WeightsError::Invalid { index: i + 1, value });
        }

        let max = lambdas.iter().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            return Ok(Self::default());
        }

        // Finite weights can still have an infinite sum.
        let lambdas = if lambdas.iter().sum::<f64>().is_finite() {
            lambdas
        } else {
            lambdas.map(|l| l / max)
        };
        let total = lambdas.iter().sum::<f64>();
        Ok(Self(lambdas.map(|l| l / total)))
    }

    /// Returns the normalized weights `λ1..λ5`.
    #[must_use]
    pub const fn lambdas(&self) -> [f64; 5] {
        self.0
    }

    /// Returns the weight of a leaf-level channel.
    #[must_use]
    pub const fn channel(&self, channel: Channel) -> f64 {
        self.0[channel.index()]
    }

    /// Returns the weight `λ5` of the topological term.
    #[must_use]
    pub const fn topology(&self) -> f64 {
        self.0[4]
    }
}

impl TryFrom<[f64; 5]> for Weights {
    type Error = WeightsError;

    fn try_from(lambdas: [f64; 5]) -> Result<Self, Self::Error> {
        Self::new(lambdas)
    }
}

impl From<Weights> for [f64; 5] {
    fn from(weights: Weights) -> Self {
        weights.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Weights, DEFAULT_WEIGHTS};
    use crate::features::Channel;

    #[test]
    fn defaults_sum_to_one() {
        let total = DEFAULT_WEIGHTS.iter().sum::<f64>();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn renormalization() {
        let weights = Weights::new([3.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(weights.channel(Channel::BranchLength), 0.75);
        assert_eq!(weights.channel(Channel::Height), 0.0);
        assert_eq!(weights.topology(), 0.25);
    }

    #[test]
    fn huge_weights() {
        let weights = Weights::new([1e308; 5]).unwrap();
        assert_eq!(weights.lambdas(), [0.2; 5]);

        let weights = Weights::new([f64::MAX, f64::MAX, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(weights.lambdas(), [0.5, 0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn invalid() {
        let err = Weights::new([0.1, f64::NAN, 0.1, 0.1, 0.1]).unwrap_err();
        assert!(err.to_string().contains("λ2"));
    }
}
