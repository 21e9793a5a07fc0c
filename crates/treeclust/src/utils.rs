//! Utility functions for the crate.

use core::cmp::Ordering;

/// Return the index and value of the minimum value in the given slice of values.
///
/// NAN values are ordered as greater than all other values. The first of
/// several equal minima is returned.
///
/// This will return `None` if the given slice is empty.
pub fn arg_min<T: PartialOrd + Copy>(values: &[T]) -> Option<(usize, T)> {
    values
        .iter()
        .enumerate()
        .min_by(|&(_, l), &(_, r)| l.partial_cmp(r).unwrap_or(Ordering::Greater))
        .map(|(i, v)| (i, *v))
}

/// Return the index and value of the maximum value in the given slice of values.
///
/// NAN values are ordered as smaller than all other values. The first of
/// several equal maxima is returned.
///
/// This will return `None` if the given slice is empty.
pub fn arg_max<T: PartialOrd + Copy>(values: &[T]) -> Option<(usize, T)> {
    values
        .iter()
        .enumerate()
        .max_by(|&(i, l), &(j, r)| l.partial_cmp(r).unwrap_or(Ordering::Less).then_with(|| j.cmp(&i)))
        .map(|(i, v)| (i, *v))
}

/// Orders two scores so that larger values come first and NAN comes last.
pub fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Orders two scores so that smaller values come first and NAN comes last.
pub fn ascending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// The number of unordered pairs among `n` items, as a float.
#[allow(clippy::cast_precision_loss)]
pub fn choose_two(n: usize) -> f64 {
    let n = n as f64;
    n * (n - 1.0) / 2.0
}

#[cfg(test)]
mod tests {
    use core::cmp::Ordering;

    use super::{arg_max, arg_min, ascending_nan_last, descending_nan_last};

    #[test]
    fn arg_extrema() {
        assert_eq!(arg_min(&[3.0, 1.0, 1.0, 2.0]), Some((1, 1.0)));
        assert_eq!(arg_max(&[3.0, 1.0, 3.0, 2.0]), Some((0, 3.0)));
        assert_eq!(arg_max(&[f64::NAN, 1.0, 2.0]), Some((2, 2.0)));
        assert_eq!(arg_min::<f64>(&[]), None);
    }

    #[test]
    fn nan_ranks_last() {
        let mut values = vec![0.5, f64::NAN, f64::INFINITY, -1.0];
        values.sort_by(|&a, &b| descending_nan_last(a, b));
        assert_eq!(&values[..3], &[f64::INFINITY, 0.5, -1.0]);
        assert!(values[3].is_nan());

        assert_eq!(ascending_nan_last(1.0, f64::NAN), Ordering::Less);
        assert_eq!(ascending_nan_last(1.0, 2.0), Ordering::Less);
    }
}
