//! Comparing a clustering against ground-truth labels.
//!
//! Nothing here feeds back into clustering or model selection.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{utils, ClusterError, Result};

/// Orders ground-truth labels to match the given ids.
///
/// # Errors
///
/// If any id has no label. The error lists the missing ids.
///
/// # Examples
///
/// ```
/// use treeclust::evaluation::align_labels;
///
/// let ids = ["t2", "t1"].map(String::from);
/// let labels = align_labels(&ids, [("t1", 1), ("t2", 2), ("t3", 2)]).unwrap();
/// assert_eq!(labels, [2, 1]);
///
/// assert!(align_labels(&ids, [("t1", 1)]).is_err());
/// ```
pub fn align_labels<I, S>(ids: &[String], pairs: I) -> Result<Vec<usize>>
where
    I: IntoIterator<Item = (S, usize)>,
    S: Into<String>,
{
    let labels = pairs.into_iter().map(|(id, l)| (id.into(), l)).collect::<HashMap<String, usize>>();

    let missing = ids.iter().filter(|id| !labels.contains_key(*id)).collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ClusterError::invalid(format!(
            "{} ids have no ground-truth label: {missing:?}",
            missing.len()
        )));
    }

    Ok(ids.iter().map(|id| labels[id]).collect())
}

/// Checks that two labelings describe the same items.
fn check_lengths(truth: &[usize], predicted: &[usize]) -> Result<()> {
    if truth.len() == predicted.len() {
        Ok(())
    } else {
        Err(ClusterError::invalid(format!(
            "{} ground-truth labels but {} predicted labels",
            truth.len(),
            predicted.len()
        )))
    }
}

/// Counts of items by predicted and true label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contingency {
    /// Distinct predicted labels, ascending.
    predicted: Vec<usize>,
    /// Distinct true labels, ascending.
    truth: Vec<usize>,
    /// `counts[p][t]` items have the `p`-th predicted and `t`-th true label.
    counts: Vec<Vec<usize>>,
}

impl Contingency {
    /// Tabulates two labelings of the same items.
    ///
    /// # Errors
    ///
    /// If the labelings have different lengths.
    pub fn new(truth: &[usize], predicted: &[usize]) -> Result<Self> {
        check_lengths(truth, predicted)?;

        let index = |labels: &[usize]| {
            let distinct = labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect::<Vec<_>>();
            let position = distinct
                .iter()
                .enumerate()
                .map(|(i, &l)| (l, i))
                .collect::<HashMap<_, _>>();
            (distinct, position)
        };
        let (true_labels, true_index) = index(truth);
        let (pred_labels, pred_index) = index(predicted);

        let mut counts = vec![vec![0; true_labels.len()]; pred_labels.len()];
        for (t, p) in truth.iter().zip(predicted) {
            counts[pred_index[p]][true_index[t]] += 1;
        }

        Ok(Self {
            predicted: pred_labels,
            truth: true_labels,
            counts,
        })
    }

    /// Distinct predicted labels, ascending.
    #[must_use]
    pub fn predicted_labels(&self) -> &[usize] {
        &self.predicted
    }

    /// Distinct true labels, ascending.
    #[must_use]
    pub fn true_labels(&self) -> &[usize] {
        &self.truth
    }

    /// Rows of counts, one per predicted label, with one column per true label.
    #[must_use]
    pub fn counts(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// The number of items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// The Adjusted Rand Index.
    ///
    /// When the expected and maximum indices coincide, the result is 1 if the
    /// observed index reaches the maximum and 0 otherwise. It is NaN for zero
    /// items.
    #[must_use]
    pub fn adjusted_rand_index(&self) -> f64 {
        let n = self.total();
        if n == 0 {
            return f64::NAN;
        }

        let observed = self.counts.iter().flatten().map(|&c| utils::choose_two(c)).sum::<f64>();
        let by_pred = self
            .counts
            .iter()
            .map(|row| utils::choose_two(row.iter().sum()))
            .sum::<f64>();
        let by_true = (0..self.truth.len())
            .map(|t| utils::choose_two(self.counts.iter().map(|row| row[t]).sum()))
            .sum::<f64>();

        let pairs = utils::choose_two(n);
        let expected = if pairs > 0.0 { by_true * by_pred / pairs } else { 0.0 };
        let max_index = 0.5 * (by_true + by_pred);
        let denominator = max_index - expected;

        if denominator == 0.0 {
            #[allow(clippy::float_cmp)]
            let perfect = observed == max_index;
            if perfect {
                1.0
            } else {
                0.0
            }
        } else {
            (observed - expected) / denominator
        }
    }

    /// The fraction of items whose true label is the most frequent one in
    /// their predicted cluster. 0 for zero items.
    #[must_use]
    pub fn purity(&self) -> f64 {
        let n = self.total();
        if n == 0 {
            return 0.0;
        }
        let majority = self
            .counts
            .iter()
            .map(|row| row.iter().copied().max().unwrap_or(0))
            .sum::<usize>();

        #[allow(clippy::cast_precision_loss)]
        let purity = majority as f64 / n as f64;
        purity
    }

    /// Maps each predicted label to the most frequent true label among its
    /// items, the smallest such label on ties.
    #[must_use]
    pub fn majority_mapping(&self) -> Vec<(usize, usize)> {
        self.predicted
            .iter()
            .zip(&self.counts)
            .map(|(&p, row)| {
                let t = row
                    .iter()
                    .enumerate()
                    .fold((0, 0), |(best, most), (t, &c)| if c > most { (t, c) } else { (best, most) })
                    .0;
                (p, self.truth[t])
            })
            .collect()
    }
}

/// The full comparison of a clustering with the ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Adjusted Rand Index.
    pub ari: f64,
    /// Purity.
    pub purity: f64,
    /// Predicted label to majority true label.
    pub mapping: Vec<(usize, usize)>,
    /// Items whose true label differs from the majority label of their cluster.
    pub misassigned: Vec<usize>,
    /// The contingency table.
    pub contingency: Contingency,
}

impl Evaluation {
    /// Compares predicted labels with true labels of the same items.
    ///
    /// # Errors
    ///
    /// If the labelings have different lengths.
    ///
    /// # Examples
    ///
    /// ```
    /// use treeclust::evaluation::Evaluation;
    ///
    /// let eval = Evaluation::new(&[1, 1, 2, 2, 2], &[1, 1, 1, 2, 2]).unwrap();
    /// assert_eq!(eval.mapping, [(1, 1), (2, 2)]);
    /// assert_eq!(eval.misassigned, [2]);
    /// assert_eq!(eval.purity, 0.8);
    /// ```
    pub fn new(truth: &[usize], predicted: &[usize]) -> Result<Self> {
        let contingency = Contingency::new(truth, predicted)?;
        let mapping = contingency.majority_mapping();

        let majority = mapping.iter().copied().collect::<HashMap<_, _>>();
        let misassigned = truth
            .iter()
            .zip(predicted)
            .enumerate()
            .filter(|&(_, (t, p))| majority.get(p) != Some(t))
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            ari: contingency.adjusted_rand_index(),
            purity: contingency.purity(),
            mapping,
            misassigned,
            contingency,
        })
    }
}

/// The Adjusted Rand Index between two labelings of the same items.
///
/// # Errors
///
/// If the labelings have different lengths.
pub fn adjusted_rand_index(truth: &[usize], predicted: &[usize]) -> Result<f64> {
    Contingency::new(truth, predicted).map(|c| c.adjusted_rand_index())
}

/// The purity of a clustering with respect to the ground truth.
///
/// # Errors
///
/// If the labelings have different lengths.
pub fn purity(truth: &[usize], predicted: &[usize]) -> Result<f64> {
    Contingency::new(truth, predicted).map(|c| c.purity())
}
