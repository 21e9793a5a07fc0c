//! Per-leaf features and topological splits extracted from a tree.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{ParseError, Tree};

/// The four leaf-level channels compared by WMFD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// `BL`: the length of the terminal edge above the leaf.
    BranchLength,
    /// `H`: the summed edge length from the root to the leaf.
    Height,
    /// `W`: the auxiliary weight annotation of the leaf.
    Weight,
    /// `D`: the number of children of the leaf's parent.
    Degree,
}

impl Channel {
    /// All channels, in the order of the first four WMFD weights.
    pub const ALL: [Self; 4] = [Self::BranchLength, Self::Height, Self::Weight, Self::Degree];

    /// The position of the channel in `ALL`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::BranchLength => 0,
            Self::Height => 1,
            Self::Weight => 2,
            Self::Degree => 3,
        }
    }

    /// The short name used in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BranchLength => "BL",
            Self::Height => "H",
            Self::Weight => "W",
            Self::Degree => "D",
        }
    }

    /// Reads this channel from a leaf's features.
    #[must_use]
    pub const fn of(self, features: &LeafFeatures) -> f64 {
        match self {
            Self::BranchLength => features.branch_length,
            Self::Height => features.height,
            Self::Weight => features.weight,
            Self::Degree => features.degree,
        }
    }
}

/// The features of one leaf.
///
/// The `Default` value, all zeros, stands in for a leaf that is absent from a
/// tree.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LeafFeatures {
    /// `BL(x)`
    pub branch_length: f64,
    /// `H(x)`
    pub height: f64,
    /// `W(x)`, 1.0 unless the label carried an `@<number>` annotation.
    pub weight: f64,
    /// `D(x)`
    pub degree: f64,
}

/// A non-trivial clade: the sorted names of the leaves below an internal node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Split(Box<[String]>);

impl Split {
    /// Creates a split from leaf names, sorting and de-duplicating them.
    #[must_use]
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(leaves: I) -> Self {
        let mut leaves = leaves.into_iter().map(Into::into).collect::<Vec<_>>();
        leaves.sort_unstable();
        leaves.dedup();
        Self(leaves.into_boxed_slice())
    }

    /// Returns the sorted leaf names.
    #[must_use]
    pub fn leaves(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of leaves in the split.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the split has no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Separates a leaf label into its name and its `@<number>` weight.
///
/// The label is split at the last `@`. If the suffix is not a finite number,
/// the whole label is the name and the weight is 1.0.
///
/// # Examples
///
/// ```
/// use wmfd::features::split_annotation;
///
/// assert_eq!(split_annotation("A@2.5"), ("A", 2.5));
/// assert_eq!(split_annotation("A"), ("A", 1.0));
/// assert_eq!(split_annotation("user@host"), ("user@host", 1.0));
/// ```
#[must_use]
pub fn split_annotation(label: &str) -> (&str, f64) {
    label
        .rsplit_once('@')
        .and_then(|(name, value)| value.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| (name, v)))
        .unwrap_or((label, 1.0))
}

/// Everything WMFD needs to know about one tree.
///
/// This is computed once per tree and shared, read-only, by every pairwise
/// comparison that involves the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreePrecomputation {
    /// Features of each leaf, keyed by leaf name.
    leaves: BTreeMap<String, LeafFeatures>,
    /// The non-trivial splits of the tree.
    splits: HashSet<Split>,
}

impl TreePrecomputation {
    /// Parses a Newick string and extracts its features.
    ///
    /// # Errors
    ///
    /// If the string is not valid Newick. See [`newick::parse`](crate::newick::parse).
    ///
    /// # Examples
    ///
    /// ```
    /// use wmfd::{features::Split, TreePrecomputation};
    ///
    /// let tree = TreePrecomputation::from_newick("(A,B,(C,D));").unwrap();
    /// assert_eq!(tree.num_leaves(), 4);
    /// assert_eq!(tree.splits().len(), 1);
    /// assert!(tree.splits().contains(&Split::new(["C", "D"])));
    /// ```
    pub fn from_newick(newick: &str) -> Result<Self, ParseError> {
        Tree::from_newick(newick).map(|tree| Self::from_tree(&tree))
    }

    /// Extracts the features of a parsed tree.
    ///
    /// Unnamed leaves are named `__anon1`, `__anon2`, ... from left to right,
    /// and repeated names get the suffixes `#2`, `#3`, ... so that every leaf
    /// has a unique name.
    #[must_use]
    pub fn from_tree(tree: &Tree) -> Self {
        let names = leaf_names(tree);
        let heights = tree.root_distances();

        let leaves = names
            .iter()
            .map(|(&i, (name, weight))| {
                let node = tree.node(i);
                #[allow(clippy::cast_precision_loss)]
                let degree = node.parent().map_or(1, |p| tree.node(p).children().len()) as f64;
                let features = LeafFeatures {
                    branch_length: node.length(),
                    height: heights[i],
                    weight: *weight,
                    degree,
                };
                (name.clone(), features)
            })
            .collect::<BTreeMap<_, _>>();

        Self {
            splits: collect_splits(tree, &names),
            leaves,
        }
    }

    /// Returns the number of leaves.
    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Returns the leaf names in sorted order.
    pub fn leaf_names(&self) -> impl Iterator<Item = &str> {
        self.leaves.keys().map(String::as_str)
    }

    /// Returns the leaves and their features in sorted order of name.
    pub fn leaves(&self) -> impl Iterator<Item = (&str, &LeafFeatures)> {
        self.leaves.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the tree has a leaf with the given name.
    #[must_use]
    pub fn contains_leaf(&self, name: &str) -> bool {
        self.leaves.contains_key(name)
    }

    /// Returns the features of the named leaf.
    #[must_use]
    pub fn features(&self, name: &str) -> Option<&LeafFeatures> {
        self.leaves.get(name)
    }

    /// Returns the non-trivial splits.
    #[must_use]
    pub const fn splits(&self) -> &HashSet<Split> {
        &self.splits
    }
}

/// Assigns every leaf a unique name and its annotated weight, keyed by node
/// index.
fn leaf_names(tree: &Tree) -> BTreeMap<usize, (String, f64)> {
    let mut anonymous = 0;
    let mut used = HashSet::<String>::new();

    tree.leaves()
        .map(|i| {
            let (name, weight) = match tree.node(i).label().map(split_annotation) {
                Some((name, weight)) if !name.is_empty() => (name.to_string(), weight),
                labelled => {
                    anonymous += 1;
                    (format!("__anon{anonymous}"), labelled.map_or(1.0, |(_, w)| w))
                }
            };

            let mut unique = name.clone();
            let mut count = 1;
            while used.contains(&unique) {
                count += 1;
                unique = format!("{name}#{count}");
            }
            used.insert(unique.clone());

            (i, (unique, weight))
        })
        .collect()
}

/// Collects the clades of all internal nodes with more than one and fewer
/// than all leaves, in a single post-order pass.
fn collect_splits(tree: &Tree, names: &BTreeMap<usize, (String, f64)>) -> HashSet<Split> {
    let total = names.len();
    let mut clades: Vec<Vec<usize>> = vec![Vec::new(); tree.len()];
    let mut splits = HashSet::new();

    for i in tree.postorder() {
        let node = tree.node(i);
        if node.is_leaf() {
            clades[i].push(i);
            continue;
        }

        let mut clade = Vec::new();
        for &c in node.children() {
            clade.append(&mut clades[c]);
        }

        if 1 < clade.len() && clade.len() < total {
            splits.insert(Split::new(clade.iter().map(|l| names[l].0.as_str())));
        }
        clades[i] = clade;
    }

    splits
}
