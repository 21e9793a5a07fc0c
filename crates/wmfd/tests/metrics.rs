//! Tests for the tree metrics.

use float_cmp::approx_eq;
use test_case::test_case;
use wmfd::{
    metric::{ChannelRanges, TreeMetric},
    NormalizationScope, RobinsonFoulds, TreePrecomputation, Weights, Wmfd,
};

mod common;

fn tree(newick: &str) -> TreePrecomputation {
    TreePrecomputation::from_newick(newick).unwrap()
}

#[test]
fn shared_leaves() {
    let a = tree("(A:1,B:1);");
    let b = tree("(A:1,B:3);");

    let terms = Wmfd::default().breakdown(&a, &b);
    assert_eq!(terms.penalty, 0.0);
    assert_eq!(terms.wnd_uncommon, 0.0);
    assert_eq!(terms.topology, 0.0);
    assert!(approx_eq!(f64, terms.wnd_common, 0.25, epsilon = 1e-12));
    assert_eq!(terms.total, terms.wnd_common);
}

#[test]
fn disjoint_leaves() {
    let a = tree("(A:1,B:1);");
    let b = tree("(C:1,D:1);");

    let terms = Wmfd::default().breakdown(&a, &b);
    assert_eq!(terms.penalty, 1.0);
    assert_eq!(terms.wnd_common, 0.0);
    assert!(approx_eq!(f64, terms.wnd_uncommon, 0.9, epsilon = 1e-12));
    assert!(approx_eq!(f64, terms.total, 0.9, epsilon = 1e-12));
}

#[test]
fn partial_overlap() {
    let a = tree("((A,B),(C,D));");
    let b = tree("((A,B),(C,E));");

    let terms = Wmfd::default().breakdown(&a, &b);
    assert!(approx_eq!(f64, terms.penalty, 0.4, epsilon = 1e-12));
    // {A, B} is shared, {C, D} and {C, E} are not.
    assert!(approx_eq!(f64, terms.topology, 2.0 / 3.0, epsilon = 1e-12));
    assert_eq!(terms.wnd_common, 0.0);
    assert!(terms.wnd_uncommon > 0.0);
}

#[test]
fn raw_scope() {
    let a = tree("(A:1,B:1);");
    let b = tree("(A:1,B:3);");

    let wmfd = Wmfd::new(Weights::default(), NormalizationScope::Raw);
    assert_eq!(wmfd.name(), "wmfd-raw");
    assert!(approx_eq!(f64, wmfd.distance(&a, &b), 0.5, epsilon = 1e-12));
    assert_eq!(wmfd.distance(&a, &a), 0.0);
}

#[test]
fn topology_only() {
    let a = tree("((A:1,B:2),(C:3,D:4));");
    let b = tree("((A:5,C:6),(B:7,D:8));");

    let weights = Weights::new([0.0, 0.0, 0.0, 0.0, 3.0]).unwrap();
    let wmfd = Wmfd::new(weights, NormalizationScope::PerPair);
    assert_eq!(wmfd.distance(&a, &b), 1.0);
}

#[test]
fn huge_weights_match_equal_weights() {
    let a = tree("((A:1,B:2),(C:3,D:4));");
    let b = tree("((A:5,C:6),(B:7,D:8));");

    let huge = Wmfd::new(Weights::new([1e308; 5]).unwrap(), NormalizationScope::PerPair);
    let unit = Wmfd::new(Weights::new([1.0; 5]).unwrap(), NormalizationScope::PerPair);
    let d = huge.distance(&a, &b);
    assert!(d > 0.0);
    assert_eq!(d, unit.distance(&a, &b));
}

#[test]
fn global_scope_uses_fitted_ranges() {
    let corpus = [tree("(A:1,B:1);"), tree("(A:1,B:3);"), tree("(A:9,B:1);")];

    let mut wmfd = Wmfd::new(Weights::default(), NormalizationScope::Global);
    assert!(wmfd.ranges().is_none());
    wmfd.fit(&corpus);

    let ranges = wmfd.ranges().copied().unwrap();
    assert_eq!(ranges, ChannelRanges::from_corpus(&corpus));

    // BL and H both span [0, 9], so B moving from 1 to 3 is a difference of 2/9.
    let expected = (0.3 + 0.2) * (2.0 / 9.0) / 2.0;
    assert!(approx_eq!(f64, wmfd.distance(&corpus[0], &corpus[1]), expected, epsilon = 1e-12));

    let per_pair = Wmfd::default();
    assert!(per_pair.distance(&corpus[0], &corpus[1]) > wmfd.distance(&corpus[0], &corpus[1]));
}

#[test]
fn fit_is_ignored_outside_global_scope() {
    let corpus = common::random_trees(5, 6, 0);
    let mut wmfd = Wmfd::default();
    wmfd.fit(&corpus);
    assert!(wmfd.ranges().is_none());
}

#[test_case(NormalizationScope::PerPair ; "per pair")]
#[test_case(NormalizationScope::Global ; "global")]
#[test_case(NormalizationScope::Raw ; "raw")]
fn identity_and_symmetry(scope: NormalizationScope) {
    let trees = common::random_partial_trees(12, 10, 42);
    let mut wmfd = Wmfd::new(Weights::default(), scope);
    wmfd.fit(&trees);

    for a in &trees {
        assert_eq!(wmfd.distance(a, a), 0.0);
        for b in &trees {
            let (ab, ba) = (wmfd.distance(a, b), wmfd.distance(b, a));
            assert!(approx_eq!(f64, ab, ba, epsilon = 1e-12), "{ab} != {ba}");
            assert!(ab >= 0.0);
        }
    }
}

#[test_case(NormalizationScope::PerPair, 8, 0 ; "per pair 8")]
#[test_case(NormalizationScope::PerPair, 30, 1 ; "per pair 30")]
#[test_case(NormalizationScope::Global, 8, 2 ; "global 8")]
#[test_case(NormalizationScope::Global, 30, 3 ; "global 30")]
fn bounded_on_shared_leaf_sets(scope: NormalizationScope, num_leaves: usize, seed: u64) {
    let trees = common::random_trees(10, num_leaves, seed);
    let mut wmfd = Wmfd::new(Weights::default(), scope);
    wmfd.fit(&trees);

    for a in &trees {
        for b in &trees {
            let d = wmfd.distance(a, b);
            assert!((0.0..=1.0).contains(&d), "{d}");
        }
    }
}

#[test]
fn robinson_foulds() {
    let a = tree("((A,B),(C,D),E);");
    let b = tree("((A,B),(C,E),D);");
    assert_eq!(RobinsonFoulds.distance(&a, &a), 0.0);
    assert_eq!(RobinsonFoulds.distance(&a, &b), 0.5);
    assert_eq!(RobinsonFoulds.distance(&tree("(A,B);"), &tree("(A,B);")), 0.0);
    assert_eq!(RobinsonFoulds.name(), "robinson-foulds");

    for a in &common::random_trees(6, 12, 7) {
        assert_eq!(RobinsonFoulds.distance(a, a), 0.0);
    }
}

#[test]
fn boxed_metrics() {
    let metrics: Vec<Box<dyn TreeMetric>> = vec![Box::new(Wmfd::default()), Box::new(RobinsonFoulds)];
    let names = metrics.iter().map(|m| m.name()).collect::<Vec<_>>();
    assert_eq!(names, ["wmfd", "robinson-foulds"]);

    let a = tree("((A,B),C);");
    for metric in &metrics {
        assert_eq!(metric.distance(&a, &a), 0.0);
    }
}
