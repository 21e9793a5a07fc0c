//! Symmetric matrices of pairwise distances between trees.

mod builder;

use serde::{Deserialize, Serialize};

use crate::{ClusterError, Result};

pub use builder::{MatrixBuilder, SkippedTree};

/// An `n x n` matrix of distances with a string identifier for every row.
///
/// The matrix is symmetric with a zero diagonal and non-negative finite
/// entries. It cannot be modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    /// The identifier of each row.
    ids: Vec<String>,
    /// The distances, in row-major order.
    values: Vec<f64>,
}

/// The minimum, maximum and mean of the distances between distinct items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixSummary {
    /// The smallest off-diagonal distance.
    pub min: f64,
    /// The largest off-diagonal distance.
    pub max: f64,
    /// The mean off-diagonal distance.
    pub mean: f64,
}

impl DistanceMatrix {
    /// Creates a matrix from the distances of every pair `(i, j)` with `i < j`,
    /// listed in row-major order.
    ///
    /// Fails on the first distance that is negative, infinite or NaN, naming
    /// the pair.
    pub(crate) fn from_upper(ids: Vec<String>, upper: &[f64]) -> Result<Self> {
        let n = ids.len();
        let mut values = vec![0.0; n * n];
        let pairs = (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j)));
        for ((i, j), &d) in pairs.zip(upper) {
            if !d.is_finite() || d < 0.0 {
                return Err(ClusterError::invalid(format!(
                    "distance between {} and {} is {d}, not a non-negative finite number",
                    ids[i], ids[j]
                )));
            }
            values[i * n + j] = d;
            values[j * n + i] = d;
        }
        Ok(Self { ids, values })
    }

    /// Creates a matrix from dense rows, checking every property of a distance
    /// matrix.
    ///
    /// # Errors
    ///
    /// - If the number of ids does not match the number of rows.
    /// - If any row does not have one value per id.
    /// - If any value is negative, infinite or NaN.
    /// - If any diagonal value is not zero.
    /// - If the matrix is not exactly symmetric.
    ///
    /// # Examples
    ///
    /// ```
    /// use treeclust::DistanceMatrix;
    ///
    /// let ids = vec!["a".to_string(), "b".to_string()];
    /// let matrix = DistanceMatrix::from_dense(ids.clone(), vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
    /// assert_eq!(matrix.get(1, 0), 1.0);
    ///
    /// assert!(DistanceMatrix::from_dense(ids, vec![vec![0.0, 1.0], vec![2.0, 0.0]]).is_err());
    /// ```
    #[allow(clippy::float_cmp)]
    pub fn from_dense(ids: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let values = Self::flatten(&ids, rows)?;
        let n = ids.len();

        for i in 0..n {
            if values[i * n + i] != 0.0 {
                return Err(ClusterError::invalid(format!(
                    "diagonal entry {i} is {}, not 0",
                    values[i * n + i]
                )));
            }
            for j in (i + 1)..n {
                let (a, b) = (values[i * n + j], values[j * n + i]);
                if a < 0.0 {
                    return Err(ClusterError::invalid(format!("entry ({i}, {j}) is negative: {a}")));
                }
                if a != b {
                    return Err(ClusterError::invalid(format!(
                        "matrix is not symmetric at ({i}, {j}): {a} != {b}"
                    )));
                }
            }
        }

        Ok(Self { ids, values })
    }

    /// Creates a matrix from dense rows, repairing small defects.
    ///
    /// The matrix is averaged with its transpose, the diagonal is set to zero
    /// and negative values are clamped to zero.
    ///
    /// # Errors
    ///
    /// - If the number of ids does not match the number of rows.
    /// - If any row does not have one value per id.
    /// - If any value is infinite or NaN.
    pub fn from_dense_sanitized(ids: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let mut values = Self::flatten(&ids, rows)?;
        let n = ids.len();

        for i in 0..n {
            values[i * n + i] = 0.0;
            for j in (i + 1)..n {
                let d = (0.5 * (values[i * n + j] + values[j * n + i])).max(0.0);
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }

        Ok(Self { ids, values })
    }

    /// Checks the shape of dense rows and that every value is finite, and
    /// concatenates them.
    fn flatten(ids: &[String], rows: Vec<Vec<f64>>) -> Result<Vec<f64>> {
        let n = ids.len();
        if rows.len() != n {
            return Err(ClusterError::invalid(format!("{n} ids but {} rows", rows.len())));
        }

        let mut values = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(ClusterError::invalid(format!(
                    "row {i} has {} values, expected {n}",
                    row.len()
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(ClusterError::invalid(format!("entry ({i}, {j}) is not finite")));
            }
            values.extend(row);
        }

        Ok(values)
    }

    /// The number of rows.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.ids.len()
    }

    /// Whether the matrix has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The identifiers of the rows.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The distance between items `i` and `j`.
    ///
    /// # Panics
    ///
    /// If either index is out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let n = self.cardinality();
        assert!(i < n && j < n, "index ({i}, {j}) out of bounds for {n} items");
        self.values[i * n + j]
    }

    /// The distances from item `i` to every item.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.cardinality();
        &self.values[i * n..(i + 1) * n]
    }

    /// The sum of each row.
    #[must_use]
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.cardinality()).map(|i| self.row(i).iter().sum()).collect()
    }

    /// The distances of every pair `(i, j)` with `i < j`.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.cardinality();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j, self.values[i * n + j])))
    }

    /// The minimum, maximum and mean of the off-diagonal distances, or `None`
    /// if there are fewer than two items.
    #[must_use]
    pub fn summary(&self) -> Option<MatrixSummary> {
        let (count, min, max, sum) = self.upper_triangle().fold(
            (0_usize, f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(count, min, max, sum), (_, _, d)| (count + 1, min.min(d), max.max(d), sum + d),
        );

        #[allow(clippy::cast_precision_loss)]
        let mean = sum / count as f64;
        (count > 0).then_some(MatrixSummary { min, max, mean })
    }
}
