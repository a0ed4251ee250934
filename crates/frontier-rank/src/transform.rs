//! Score transforms
//!
//! The normalized policy maps efficiency scores onto a standard normal
//! scale by rank, then winsorizes:
//!
//! ```text
//! z_i = Phi^-1((rank_i - 0.5) / n)
//! z_i = clamp(z_i, P_lower(z), P_upper(z))
//! ```
//!
//! Ranks are 1-based with ties sharing their average rank. Percentiles use
//! linear interpolation between order statistics.

use crate::{RankError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// 1-based ranks with ties averaged.
///
/// NaN values must be removed beforehand; they sort last and get their own
/// ranks.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end share ranks start+1..=end.
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// Inverse standard-normal transform of average ranks.
pub fn normal_scores(values: &[f64]) -> Result<Vec<f64>> {
    let n = values.len() as f64;
    let normal = Normal::new(0.0, 1.0).map_err(|e| RankError::Distribution(e.to_string()))?;

    Ok(average_ranks(values)
        .into_iter()
        .map(|rank| normal.inverse_cdf((rank - 0.5) / n))
        .collect())
}

/// Quantile `q` in `[0, 1]` with linear interpolation. NaN for empty input.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    let fraction = position - below as f64;

    sorted[below] + (sorted[above] - sorted[below]) * fraction
}

/// Clip values to the `[lower, upper]` quantile band of the values themselves.
pub fn winsorize(values: &[f64], lower: f64, upper: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let low = percentile(values, lower);
    let high = percentile(values, upper);
    values.iter().map(|v| v.clamp(low, high)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(&[0.9, 0.2, 0.5, 0.2], &[4.0, 1.5, 3.0, 1.5])]
    #[case(&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0])]
    #[case(&[3.0, 1.0, 2.0], &[3.0, 1.0, 2.0])]
    #[case(&[], &[])]
    fn test_average_ranks(#[case] values: &[f64], #[case] expected: &[f64]) {
        assert_eq!(average_ranks(values), expected);
    }

    #[test]
    fn test_normal_scores_symmetric() {
        let z = normal_scores(&[0.1, 0.4, 0.7, 1.0]).unwrap();
        // Phi^-1(0.125), Phi^-1(0.375), ...
        assert_relative_eq!(z[0], -1.150_349_380_376_008_5, epsilon = 1e-6);
        assert_relative_eq!(z[0], -z[3], epsilon = 1e-9);
        assert_relative_eq!(z[1], -z[2], epsilon = 1e-9);
        assert!(z[1] < 0.0);
    }

    #[test]
    fn test_normal_scores_single_value() {
        let z = normal_scores(&[0.42]).unwrap();
        assert_relative_eq!(z[0], 0.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(1.0, 5.0)]
    #[case(0.5, 3.0)]
    #[case(0.25, 2.0)]
    #[case(0.1, 1.4)]
    fn test_percentile_linear(#[case] q: f64, #[case] expected: f64) {
        assert_relative_eq!(percentile(&[5.0, 1.0, 3.0, 2.0, 4.0], q), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_empty() {
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_winsorize() {
        let values: Vec<f64> = (1..=21).map(f64::from).collect();
        let clipped = winsorize(&values, 0.05, 0.95);

        assert_relative_eq!(clipped[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(clipped[20], 20.0, epsilon = 1e-12);
        assert_relative_eq!(clipped[10], 11.0, epsilon = 1e-12);
    }
}
