//! Order-statistic helpers.
//!
//! Percentiles use linear interpolation between the two closest ranks
//! (Hyndman & Fan type 7, numpy's default `linear` method), including numpy's
//! two-sided lerp so thresholds match the reference tables bit for bit.

use ordered_float::OrderedFloat;

/// Sorts the finite values ascending. NaNs and infinities are dropped.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_unstable_by_key(|v| OrderedFloat(*v));
    sorted
}

/// Percentile `q` (in `[0, 100]`) of an ascending slice.
///
/// Returns `None` for an empty slice or a `q` outside `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=100.0).contains(&q) {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let virtual_index = (n - 1) as f64 * (q / 100.0);
    let below = virtual_index.floor();
    let gamma = virtual_index - below;
    let lo = (below as usize).min(n - 1);
    let hi = (lo + 1).min(n - 1);
    Some(lerp(sorted[lo], sorted[hi], gamma))
}

/// Percentile `q` (in `[0, 100]`) of unsorted values, ignoring NaNs and
/// infinities.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    percentile_sorted(&sorted_finite(values), q)
}

/// Median of an ascending slice.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}
