//! Tests for k-medoids clustering.

use test_case::test_case;
use treeclust::{evaluation, ClusterError, Init, PamConfig};

mod common;

#[test]
fn two_pairs() {
    let matrix = common::two_pairs();

    for config in [PamConfig::default(), PamConfig::default().with_init(Init::Build)] {
        let assignment = config.fit(&matrix, 2).unwrap();
        assert_eq!(assignment.labels(), &[1, 1, 2, 2]);
        assert_eq!(assignment.objective(), 2.0);
        assert_eq!(assignment.k(), 2);
        assert_eq!(assignment.sizes(), [2, 2]);
        assert!(assignment.converged());
        assert_eq!(assignment.members(2), [2, 3]);

        let ari = evaluation::adjusted_rand_index(&[1, 1, 2, 2], assignment.labels()).unwrap();
        assert_eq!(ari, 1.0);
    }
}

#[test]
fn single_cluster_closed_form() {
    let matrix = common::two_pairs();
    let assignment = PamConfig::default().fit(&matrix, 1).unwrap();

    // Row sums are 12, 12, 11 and 13.
    assert_eq!(assignment.medoids(), &[2]);
    assert_eq!(assignment.objective(), 11.0);
    assert_eq!(assignment.labels(), &[1, 1, 1, 1]);
    assert_eq!(assignment.n_iter(), 0);

    let (matrix, _) = common::line_groups(3, 7, 5);
    let sums = matrix.row_sums();
    let assignment = PamConfig::default().par_fit(&matrix, 1).unwrap();
    let m = assignment.medoids()[0];
    assert!(sums.iter().all(|&s| sums[m] <= s));
    assert!(sums[..m].iter().all(|&s| sums[m] < s));
}

#[test_case(2, 10, 0 ; "2 groups")]
#[test_case(3, 8, 1 ; "3 groups")]
#[test_case(5, 6, 2 ; "5 groups")]
fn recovers_groups(k: usize, group_size: usize, seed: u64) {
    let (matrix, truth) = common::line_groups(k, group_size, seed);
    let config = PamConfig::default().with_seed(seed).with_init(Init::Build);

    let assignment = config.fit(&matrix, k).unwrap();
    let ari = evaluation::adjusted_rand_index(&truth, assignment.labels()).unwrap();
    assert_eq!(ari, 1.0);

    let mut medoids = assignment.medoids().to_vec();
    medoids.sort_unstable();
    assert_eq!(medoids, assignment.medoids());

    // Cluster c has the c-th smallest medoid.
    for (c, &m) in assignment.medoids().iter().enumerate() {
        assert_eq!(assignment.labels()[m], c + 1);
    }
}

#[test_case(2, 0 ; "k = 2")]
#[test_case(4, 1 ; "k = 4")]
#[test_case(7, 2 ; "k = 7")]
fn fit_and_par_fit_agree(k: usize, seed: u64) {
    let (matrix, _) = common::line_groups(4, 9, seed);
    for init in [Init::Random, Init::Build] {
        let config = PamConfig::default().with_seed(seed).with_init(init);
        let assignment = config.fit(&matrix, k).unwrap();
        let par_assignment = config.par_fit(&matrix, k).unwrap();
        assert_eq!(assignment, par_assignment);
        assert_eq!(assignment.n_init(), config.n_init);
        assert_eq!(assignment.seed(), seed);
    }
}

#[test_case(2 ; "k = 2")]
#[test_case(3 ; "k = 3")]
#[test_case(6 ; "k = 6")]
fn objective_never_increases(k: usize) {
    let (matrix, _) = common::line_groups(3, 10, 9);
    for n_init in [1, 5] {
        let assignment = PamConfig::default().with_n_init(n_init).fit(&matrix, k).unwrap();
        let history = assignment.history();
        assert!(!history.is_empty());
        assert!(history.windows(2).all(|w| w[1] <= w[0]), "{history:?}");
        assert_eq!(history.last().copied(), Some(assignment.objective()));

        let objective = (0..matrix.cardinality())
            .map(|i| matrix.get(i, assignment.medoids()[assignment.labels()[i] - 1]))
            .sum::<f64>();
        assert!((objective - assignment.objective()).abs() < 1e-9);
    }
}

#[test]
fn iteration_cap() {
    let (matrix, _) = common::line_groups(3, 10, 4);
    let assignment = PamConfig::default().with_max_iter(0).with_n_init(3).fit(&matrix, 3).unwrap();
    assert!(!assignment.converged());
    assert_eq!(assignment.n_iter(), 0);
    assert_eq!(assignment.history().len(), 1);
}

#[test]
fn distances_to_medoids() {
    let matrix = common::two_pairs();
    let assignment = PamConfig::default().fit(&matrix, 2).unwrap();
    let table = assignment.distances_to_medoids(&matrix);

    assert_eq!(table.len(), 4);
    for (i, row) in table.iter().enumerate() {
        assert_eq!(row.len(), 2);
        let nearest = row.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(nearest, row[assignment.labels()[i] - 1]);
    }
}

#[test_case(0 ; "k = 0")]
#[test_case(4 ; "k = n")]
#[test_case(9 ; "k > n")]
fn invalid_k(k: usize) {
    let matrix = common::two_pairs();
    let err = PamConfig::default().fit(&matrix, k).unwrap_err();
    assert!(matches!(err, ClusterError::InvalidParameter(_)));
}

#[test]
fn invalid_config() {
    let matrix = common::two_pairs();
    let err = PamConfig::default().with_n_init(0).par_fit(&matrix, 2).unwrap_err();
    assert!(matches!(err, ClusterError::InvalidParameter(_)));

    let single = treeclust::DistanceMatrix::from_dense(common::ids(1), vec![vec![0.0]]).unwrap();
    assert!(PamConfig::default().fit(&single, 1).is_err());
}
