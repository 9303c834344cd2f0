//! Mann-Kendall S statistic with tie-corrected variance.

use crate::math::special::two_sided_p_value;
use ordered_float::OrderedFloat;

/// Raw Mann-Kendall statistics for one sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MannKendall {
    pub s: i64,
    pub var_s: f64,
    pub z: f64,
    pub p: f64,
}

impl MannKendall {
    /// The conservative result used below the normal-approximation floor.
    pub const FLOORED: MannKendall = MannKendall {
        s: 0,
        var_s: 0.0,
        z: 0.0,
        p: 1.0,
    };
}

/// Computes S, its variance, the continuity-corrected Z and the two-sided p.
pub(crate) fn mann_kendall(values: &[f64]) -> MannKendall {
    let s = s_statistic(values);
    let var_s = variance(values);
    let z = match s {
        0 => 0.0,
        s if var_s <= 0.0 => s.signum() as f64 * f64::INFINITY,
        s if s > 0 => (s - 1) as f64 / var_s.sqrt(),
        s => (s + 1) as f64 / var_s.sqrt(),
    };
    MannKendall {
        s,
        var_s,
        z,
        p: two_sided_p_value(z),
    }
}

/// Sum of `sign(x[j] - x[i])` over all pairs `i < j`.
pub(crate) fn s_statistic(values: &[f64]) -> i64 {
    let mut s = 0i64;
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            s += match b.partial_cmp(a) {
                Some(std::cmp::Ordering::Greater) => 1,
                Some(std::cmp::Ordering::Less) => -1,
                _ => 0,
            };
        }
    }
    s
}

/// `n(n-1)(2n+1)/18` minus the same term for every group of tied values.
fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let ties: f64 = tie_groups(values)
        .into_iter()
        .map(|t| {
            let t = t as f64;
            t * (t - 1.0) * (2.0 * t + 1.0)
        })
        .sum();
    (n * (n - 1.0) * (2.0 * n + 1.0) - ties) / 18.0
}

/// Sizes of the groups of exactly equal values, singletons included.
pub(crate) fn tie_groups(values: &[f64]) -> Vec<usize> {
    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();
    sorted
        .chunk_by(|a, b| a == b)
        .map(|group| group.len())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_counts_concordant_minus_discordant() {
        assert_eq!(s_statistic(&[1.0, 2.0, 3.0, 4.0]), 6);
        assert_eq!(s_statistic(&[4.0, 3.0, 2.0, 1.0]), -6);
        assert_eq!(s_statistic(&[1.0, 3.0, 2.0]), 1);
        assert_eq!(s_statistic(&[2.0, 2.0, 2.0]), 0);
    }

    #[test]
    fn tie_groups_by_exact_equality() {
        let mut groups = tie_groups(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        groups.sort_unstable();
        assert_eq!(groups, vec![1, 2, 3]);
    }

    #[test]
    fn variance_without_ties() {
        // n = 10: 10 * 9 * 21 / 18
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let result = mann_kendall(&values);
        assert!((result.var_s - 105.0).abs() < 1e-12);
        assert_eq!(result.s, 45);
        assert!((result.z - 44.0 / 105f64.sqrt()).abs() < 1e-12);
        assert!(result.p < 1e-4);
    }

    #[test]
    fn variance_with_ties() {
        // One pair tied: 10 * 9 * 21 - 2 * 1 * 5, over 18
        let values = [0.0, 1.0, 2.0, 3.0, 3.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let result = mann_kendall(&values);
        assert!((result.var_s - (1890.0 - 10.0) / 18.0).abs() < 1e-12);
        assert_eq!(result.s, 44);
    }

    #[test]
    fn constant_sequence_has_unit_p() {
        let result = mann_kendall(&[4.2; 12]);
        assert_eq!(result.s, 0);
        assert_eq!(result.var_s, 0.0);
        assert_eq!(result.z, 0.0);
        assert_eq!(result.p, 1.0);
    }

    #[test]
    fn negative_s_uses_upper_correction() {
        let values: Vec<f64> = (0..10).rev().map(f64::from).collect();
        let result = mann_kendall(&values);
        assert_eq!(result.s, -45);
        assert!((result.z + 44.0 / 105f64.sqrt()).abs() < 1e-12);
    }
}
