//! Tabular renderings of matrices, clusterings and scores.
//!
//! Tables are returned as rows of strings so that a driver can write them in
//! any format. Floats are written with a fixed number of decimals, NaN as an
//! empty field and infinities as `inf`.

use crate::{
    evaluation::{Contingency, Evaluation},
    ClusterAssignment, ClusterError, DistanceMatrix, ModelSelectionResult, Result, ValidityScores,
};

/// Decimals used for distances.
pub const DISTANCE_DECIMALS: usize = 8;

/// Decimals used for scores and objectives.
pub const METRIC_DECIMALS: usize = 6;

/// A header and rows of string fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// The names of the columns.
    pub header: Vec<String>,
    /// The rows, each with one field per column.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given column names and no rows.
    fn new<I: IntoIterator<Item = S>, S: Into<String>>(header: I) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Renders the table as comma-separated lines, quoting fields that need it.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let line = |fields: &[String]| {
            let mut line = fields.iter().map(|f| escape(f)).collect::<Vec<_>>().join(",");
            line.push('\n');
            line
        };

        core::iter::once(&self.header)
            .chain(&self.rows)
            .map(|fields| line(fields))
            .collect()
    }
}

/// Quotes a field containing a comma, a quote or a line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Formats a float with a fixed number of decimals.
#[must_use]
pub fn format_float(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        String::new()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:.decimals$}")
    }
}

/// The full matrix: `id,<ids...>` then one row per item.
#[must_use]
pub fn matrix_table(matrix: &DistanceMatrix, decimals: usize) -> Table {
    let mut table = Table::new(core::iter::once("id").chain(matrix.ids().iter().map(String::as_str)));
    table.rows = matrix
        .ids()
        .iter()
        .enumerate()
        .map(|(i, id)| {
            core::iter::once(id.clone())
                .chain(matrix.row(i).iter().map(|&d| format_float(d, decimals)))
                .collect()
        })
        .collect();
    table
}

/// Every pair of distinct items: `id_i,id_j,dist`.
#[must_use]
pub fn pairs_table(matrix: &DistanceMatrix, decimals: usize) -> Table {
    let ids = matrix.ids();
    let mut table = Table::new(["id_i", "id_j", "dist"]);
    table.rows = matrix
        .upper_triangle()
        .map(|(i, j, d)| vec![ids[i].clone(), ids[j].clone(), format_float(d, decimals)])
        .collect();
    table
}

/// Checks that a clustering labels every item of the matrix.
fn check_assignment(matrix: &DistanceMatrix, assignment: &ClusterAssignment) -> Result<()> {
    let (n, labelled) = (matrix.cardinality(), assignment.labels().len());
    if n == labelled {
        Ok(())
    } else {
        Err(ClusterError::invalid(format!("{labelled} labels for a matrix of {n} items")))
    }
}

/// The cluster of each item: `id,pred_cluster`.
///
/// # Errors
///
/// If the clustering does not label every item of the matrix.
pub fn clusters_table(matrix: &DistanceMatrix, assignment: &ClusterAssignment) -> Result<Table> {
    check_assignment(matrix, assignment)?;
    let mut table = Table::new(["id", "pred_cluster"]);
    table.rows = matrix
        .ids()
        .iter()
        .zip(assignment.labels())
        .map(|(id, l)| vec![id.clone(), l.to_string()])
        .collect();
    Ok(table)
}

/// The medoid of each cluster: `cluster,medoid_id`.
///
/// # Errors
///
/// If the clustering does not label every item of the matrix.
pub fn medoids_table(matrix: &DistanceMatrix, assignment: &ClusterAssignment) -> Result<Table> {
    check_assignment(matrix, assignment)?;
    let ids = matrix.ids();
    let mut table = Table::new(["cluster", "medoid_id"]);
    table.rows = assignment
        .medoids()
        .iter()
        .enumerate()
        .map(|(c, &m)| vec![(c + 1).to_string(), ids[m].clone()])
        .collect();
    Ok(table)
}

/// The distance from each item to each medoid: `id,medoid_1..medoid_k`.
#[must_use]
pub fn medoid_distances_table(matrix: &DistanceMatrix, assignment: &ClusterAssignment, decimals: usize) -> Table {
    let header = core::iter::once("id".to_string()).chain((1..=assignment.k()).map(|c| format!("medoid_{c}")));
    let mut table = Table::new(header);
    table.rows = matrix
        .ids()
        .iter()
        .zip(assignment.distances_to_medoids(matrix))
        .map(|(id, row)| {
            core::iter::once(id.clone())
                .chain(row.into_iter().map(|d| format_float(d, decimals)))
                .collect()
        })
        .collect();
    table
}

/// One row of clustering diagnostics:
/// `k,objective,n_iter,n_init,seed,silhouette,ch,db,ARI`.
///
/// The ARI field is empty without ground truth.
#[must_use]
pub fn metrics_table(assignment: &ClusterAssignment, scores: &ValidityScores, ari: Option<f64>) -> Table {
    let f = |v: f64| format_float(v, METRIC_DECIMALS);
    let mut table = Table::new(["k", "objective", "n_iter", "n_init", "seed", "silhouette", "ch", "db", "ARI"]);
    table.rows.push(vec![
        assignment.k().to_string(),
        f(assignment.objective()),
        assignment.n_iter().to_string(),
        assignment.n_init().to_string(),
        assignment.seed().to_string(),
        f(scores.silhouette),
        f(scores.calinski_harabasz),
        f(scores.davies_bouldin),
        ari.map_or_else(String::new, f),
    ]);
    table
}

/// The scores of every candidate of a model selection, in ascending order of
/// `k`: `k,objective,silhouette,ch,db,selected`.
#[must_use]
pub fn selection_table(result: &ModelSelectionResult) -> Table {
    let f = |v: f64| format_float(v, METRIC_DECIMALS);
    let mut table = Table::new(["k", "objective", "silhouette", "ch", "db", "selected"]);
    table.rows = result
        .candidates()
        .iter()
        .map(|c| {
            vec![
                c.k.to_string(),
                f(c.assignment.objective()),
                f(c.scores.silhouette),
                f(c.scores.calinski_harabasz),
                f(c.scores.davies_bouldin),
                u8::from(c.k == result.k()).to_string(),
            ]
        })
        .collect();
    table
}

/// The contingency table: `pred\true,<true labels...>`.
#[must_use]
pub fn contingency_table(contingency: &Contingency) -> Table {
    let header = core::iter::once("pred\\true".to_string()).chain(contingency.true_labels().iter().map(ToString::to_string));
    let mut table = Table::new(header);
    table.rows = contingency
        .predicted_labels()
        .iter()
        .zip(contingency.counts())
        .map(|(p, row)| core::iter::once(p.to_string()).chain(row.iter().map(ToString::to_string)).collect())
        .collect();
    table
}

/// The majority mapping: `pred_cluster,true_majority`.
#[must_use]
pub fn mapping_table(evaluation: &Evaluation) -> Table {
    let mut table = Table::new(["pred_cluster", "true_majority"]);
    table.rows = evaluation
        .mapping
        .iter()
        .map(|(p, t)| vec![p.to_string(), t.to_string()])
        .collect();
    table
}

/// The misassigned items: `id,true,pred`.
///
/// # Errors
///
/// If `ids`, `truth` and `predicted` differ in length, or the evaluation
/// refers to an item beyond them.
pub fn misassigned_table(ids: &[String], truth: &[usize], predicted: &[usize], evaluation: &Evaluation) -> Result<Table> {
    let n = ids.len();
    if truth.len() != n || predicted.len() != n {
        return Err(ClusterError::invalid(format!(
            "{n} ids, {} ground-truth labels and {} predicted labels",
            truth.len(),
            predicted.len()
        )));
    }
    if let Some(&i) = evaluation.misassigned.iter().find(|&&i| i >= n) {
        return Err(ClusterError::invalid(format!("misassigned item {i} is out of range for {n} items")));
    }

    let mut table = Table::new(["id", "true", "pred"]);
    table.rows = evaluation
        .misassigned
        .iter()
        .map(|&i| vec![ids[i].clone(), truth[i].to_string(), predicted[i].to_string()])
        .collect();
    Ok(table)
}
