//! The Weighted Multi-Feature Distance between two trees.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    features::{Channel, LeafFeatures},
    TreePrecomputation, Weights,
};

use super::{ParTreeMetric, TreeMetric};

/// Where the per-channel min and max used for min-max normalization come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NormalizationScope {
    /// The range of each channel over the union of the leaves of the two
    /// compared trees. Values do not depend on the rest of the batch.
    #[default]
    PerPair,
    /// The range of each channel over every leaf of every tree in the batch,
    /// fitted once with [`TreeMetric::fit`].
    Global,
    /// No normalization. Channel differences are taken on the raw values, so
    /// the distance is not bounded by 1.
    Raw,
}

/// The per-channel minimum and maximum used for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRanges {
    /// Minimum of each channel, indexed by [`Channel::index`].
    min: [f64; 4],
    /// Maximum of each channel, indexed by [`Channel::index`].
    max: [f64; 4],
}

impl ChannelRanges {
    /// The ranges over every leaf of the given trees.
    ///
    /// Zero is always inside the ranges since it is the value a tree takes on
    /// a leaf it does not have.
    pub fn from_corpus<'a, I: IntoIterator<Item = &'a TreePrecomputation>>(trees: I) -> Self {
        let mut ranges = Self {
            min: [0.0; 4],
            max: [0.0; 4],
        };
        for tree in trees {
            for (_, features) in tree.leaves() {
                ranges.include(features);
            }
        }
        ranges
    }

    /// The ranges over the union of the leaves of two trees, where a tree
    /// missing a leaf contributes zeros for it.
    fn of_pair(a: &TreePrecomputation, b: &TreePrecomputation, union: &BTreeSet<&str>) -> Self {
        let mut ranges = Self {
            min: [f64::INFINITY; 4],
            max: [f64::NEG_INFINITY; 4],
        };
        for &x in union {
            ranges.include(&a.features(x).copied().unwrap_or_default());
            ranges.include(&b.features(x).copied().unwrap_or_default());
        }
        ranges
    }

    /// Widens the ranges to include the given leaf.
    fn include(&mut self, features: &LeafFeatures) {
        for c in Channel::ALL {
            let v = c.of(features);
            self.min[c.index()] = self.min[c.index()].min(v);
            self.max[c.index()] = self.max[c.index()].max(v);
        }
    }

    /// The minimum of a channel.
    #[must_use]
    pub const fn min(&self, channel: Channel) -> f64 {
        self.min[channel.index()]
    }

    /// The maximum of a channel.
    #[must_use]
    pub const fn max(&self, channel: Channel) -> f64 {
        self.max[channel.index()]
    }

    /// Min-max normalizes a value of a channel into `[0, 1]`.
    ///
    /// A channel with an empty range normalizes to 0. Values outside the range
    /// are clamped.
    #[must_use]
    pub fn normalize(&self, channel: Channel, value: f64) -> f64 {
        let (lo, hi) = (self.min(channel), self.max(channel));
        if hi > lo {
            ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// The terms that make up one WMFD value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WmfdBreakdown {
    /// `P`, the fraction of leaves not shared by the two trees.
    pub penalty: f64,
    /// Weighted mean channel difference over shared leaves.
    pub wnd_common: f64,
    /// Weighted mean channel difference over leaves in only one tree.
    pub wnd_uncommon: f64,
    /// `HD`, one minus the Jaccard similarity of the split sets, unweighted.
    pub topology: f64,
    /// `P·WND_uncommon + WND_common + λ5·HD`.
    pub total: f64,
}

/// The Weighted Multi-Feature Distance.
///
/// With normalized channels the distance is in `[0, 1]` when the two trees
/// have the same leaves or no leaves in common. When they share only some
/// leaves, both the shared and the unshared terms contribute and the distance
/// may exceed 1.
///
/// # Examples
///
/// ```
/// use wmfd::{metric::TreeMetric, TreePrecomputation, Wmfd};
///
/// let a = TreePrecomputation::from_newick("((A:1,B:1):1,C:2);").unwrap();
/// let b = TreePrecomputation::from_newick("((A:1,C:1):1,B:2);").unwrap();
///
/// let wmfd = Wmfd::default();
/// assert_eq!(wmfd.distance(&a, &a), 0.0);
///
/// let d = wmfd.distance(&a, &b);
/// assert_eq!(d, wmfd.distance(&b, &a));
/// assert!(0.0 < d && d <= 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wmfd {
    /// The channel weights.
    weights: Weights,
    /// The normalization scope.
    scope: NormalizationScope,
    /// Ranges fitted on a corpus, used with `NormalizationScope::Global`.
    #[serde(skip)]
    ranges: Option<ChannelRanges>,
}

impl Wmfd {
    /// Creates the metric with the given weights and normalization scope.
    #[must_use]
    pub const fn new(weights: Weights, scope: NormalizationScope) -> Self {
        Self {
            weights,
            scope,
            ranges: None,
        }
    }

    /// Uses fixed ranges for global normalization instead of fitting them.
    #[must_use]
    pub const fn with_ranges(mut self, ranges: ChannelRanges) -> Self {
        self.ranges = Some(ranges);
        self
    }

    /// The channel weights.
    #[must_use]
    pub const fn weights(&self) -> &Weights {
        &self.weights
    }

    /// The normalization scope.
    #[must_use]
    pub const fn scope(&self) -> NormalizationScope {
        self.scope
    }

    /// The fitted global ranges, if any.
    #[must_use]
    pub const fn ranges(&self) -> Option<&ChannelRanges> {
        self.ranges.as_ref()
    }

    /// Computes WMFD and the terms it is made of.
    ///
    /// With `NormalizationScope::Global` and no fitted ranges, the ranges of
    /// the two trees alone are used.
    #[must_use]
    pub fn breakdown(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> WmfdBreakdown {
        let union = a.leaf_names().chain(b.leaf_names()).collect::<BTreeSet<_>>();

        let ranges = match self.scope {
            NormalizationScope::PerPair => Some(ChannelRanges::of_pair(a, b, &union)),
            NormalizationScope::Global => Some(self.ranges.unwrap_or_else(|| ChannelRanges::from_corpus([a, b]))),
            NormalizationScope::Raw => None,
        };
        let scale = |c: Channel, v: f64| ranges.map_or(v, |r| r.normalize(c, v));

        let (mut common, mut uncommon) = ([0.0; 4], [0.0; 4]);
        let (mut num_common, mut num_uncommon) = (0_usize, 0_usize);
        for &x in &union {
            let (fa, fb) = (a.features(x), b.features(x));
            let bucket = if fa.is_some() && fb.is_some() {
                num_common += 1;
                &mut common
            } else {
                num_uncommon += 1;
                &mut uncommon
            };

            let (fa, fb) = (fa.copied().unwrap_or_default(), fb.copied().unwrap_or_default());
            for c in Channel::ALL {
                bucket[c.index()] += (scale(c, c.of(&fa)) - scale(c, c.of(&fb))).abs();
            }
        }

        let penalty = if union.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let shared = num_common as f64 / union.len() as f64;
            1.0 - shared
        };
        let wnd_common = self.weighted_mean(&common, num_common);
        let wnd_uncommon = self.weighted_mean(&uncommon, num_uncommon);
        let topology = split_dissimilarity(a, b);

        WmfdBreakdown {
            penalty,
            wnd_common,
            wnd_uncommon,
            topology,
            total: penalty.mul_add(wnd_uncommon, wnd_common) + self.weights.topology() * topology,
        }
    }

    /// `λ1·s̄1 + λ2·s̄2 + λ3·s̄3 + λ4·s̄4` for per-channel sums over `count` leaves.
    fn weighted_mean(&self, sums: &[f64; 4], count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = count as f64;
        Channel::ALL
            .iter()
            .map(|&c| self.weights.channel(c) * sums[c.index()] / count)
            .sum()
    }
}

/// `1 − |S_A ∩ S_B| / |S_A ∪ S_B|`, or 0 if neither tree has a split.
fn split_dissimilarity(a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
    let shared = a.splits().intersection(b.splits()).count();
    let union = a.splits().len() + b.splits().len() - shared;
    if union == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let similarity = shared as f64 / union as f64;
        1.0 - similarity
    }
}

impl TreeMetric for Wmfd {
    fn distance(&self, a: &TreePrecomputation, b: &TreePrecomputation) -> f64 {
        self.breakdown(a, b).total
    }

    fn name(&self) -> &str {
        match self.scope {
            NormalizationScope::PerPair => "wmfd",
            NormalizationScope::Global => "wmfd-global",
            NormalizationScope::Raw => "wmfd-raw",
        }
    }

    fn fit(&mut self, corpus: &[TreePrecomputation]) {
        if self.scope == NormalizationScope::Global {
            self.ranges = Some(ChannelRanges::from_corpus(corpus));
        }
    }
}

impl ParTreeMetric for Wmfd {}
