//! Small numeric helpers used by trajectory smoothing: least-squares linear
//! regression, mean, and n-gram counting over a sequence of symbols.

use crate::error::{CoreError, Result};

/// Ordinary least-squares fit of `y = a*x + b` through `points`.
///
/// Returns `(a, b)`. Requires at least two points with more than one
/// distinct `x` value, otherwise the slope is undefined.
pub fn linear_regression(points: &[(f64, f64)]) -> Result<(f64, f64)> {
    if points.len() < 2 {
        return Err(CoreError::InvalidArgument(
            "linear regression needs at least 2 points".into(),
        ));
    }

    let n = points.len() as f64;
    let mean_x = fmean(&points.iter().map(|p| p.0).collect::<Vec<_>>());
    let mean_y = fmean(&points.iter().map(|p| p.1).collect::<Vec<_>>());

    let mut num = 0.0;
    let mut den = 0.0;
    for &(x, y) in points {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x) * (x - mean_x);
    }

    if den == 0.0 {
        return Err(CoreError::InvalidArgument(
            "linear regression requires more than one distinct x value".into(),
        ));
    }

    let a = num / den;
    let b = mean_y - a * mean_x;
    let _ = n;
    Ok((a, b))
}

/// Evaluate `y = a*x + b`.
pub fn linear_fct(a: f64, b: f64, x: f64) -> f64 {
    a * x + b
}

/// Arithmetic mean of `values`. Returns `0.0` for an empty slice.
pub fn fmean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Count how many times each length-`n` contiguous window (n-gram) occurs
/// in `symbols`, keyed by the tuple of symbols it contains.
///
/// This mirrors counting "items" (n-grams) out of a sequence of discrete
/// "symbols", used to detect identities that only ever appear in short,
/// scattered runs rather than sustained stretches.
pub fn symbols_to_items<T: Clone + Eq + std::hash::Hash>(
    symbols: &[T],
    n: usize,
) -> std::collections::HashMap<Vec<T>, usize> {
    let mut counts = std::collections::HashMap::new();
    if n == 0 || symbols.len() < n {
        return counts;
    }
    for window in symbols.windows(n) {
        *counts.entry(window.to_vec()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_a_perfect_line() {
        let points = vec![(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)];
        let (a, b) = linear_regression(&points).unwrap();
        assert!((a - 2.0).abs() < 1e-9);
        assert!((b - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_single_point() {
        assert!(linear_regression(&[(0.0, 0.0)]).is_err());
    }

    #[test]
    fn rejects_vertical_line() {
        assert!(linear_regression(&[(1.0, 0.0), (1.0, 5.0)]).is_err());
    }

    #[test]
    fn fmean_of_empty_is_zero() {
        assert_eq!(fmean(&[]), 0.0);
    }

    #[test]
    fn counts_repeated_ngrams() {
        let symbols = vec![true, true, true, true, false, true, true, true, true];
        let counts = symbols_to_items(&symbols, 4);
        let all_true = vec![true, true, true, true];
        assert_eq!(counts.get(&all_true).copied().unwrap_or(0), 2);
    }
}
