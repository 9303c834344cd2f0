//! Theil-Sen slope with the rank-based confidence interval of Sen (1968).

use crate::math::percentile::median_sorted;
use crate::math::special::normal_ppf;
use crate::trend::mann_kendall::tie_groups;
use ordered_float::OrderedFloat;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TheilSen {
    pub slope: f64,
    pub intercept: f64,
    pub lcl: f64,
    pub ucl: f64,
}

/// Fits `y = intercept + slope * x`.
///
/// Only pairs with a strictly increasing `x` contribute a slope. Returns
/// `None` when no such pair exists.
pub(crate) fn theil_sen(x: &[f64], y: &[f64], confidence: f64) -> Option<TheilSen> {
    let mut slopes = Vec::with_capacity(x.len() * x.len().saturating_sub(1) / 2);
    for i in 0..x.len() {
        for j in i + 1..x.len() {
            let dx = x[j] - x[i];
            if dx > 0.0 {
                slopes.push((y[j] - y[i]) / dx);
            }
        }
    }
    if slopes.is_empty() {
        return None;
    }
    slopes.sort_unstable_by_key(|s| OrderedFloat(*s));
    let slope = median_sorted(&slopes)?;

    let mut xs = x.to_vec();
    xs.sort_unstable_by_key(|v| OrderedFloat(*v));
    let mut ys = y.to_vec();
    ys.sort_unstable_by_key(|v| OrderedFloat(*v));
    let intercept = median_sorted(&ys)? - slope * median_sorted(&xs)?;

    let (lcl, ucl) = confidence_bounds(&slopes, x, y, confidence);
    Some(TheilSen {
        slope,
        intercept,
        lcl,
        ucl,
    })
}

fn confidence_bounds(sorted_slopes: &[f64], x: &[f64], y: &[f64], confidence: f64) -> (f64, f64) {
    let n = y.len() as f64;
    let nt = sorted_slopes.len();
    let tie_term = |values: &[f64]| -> f64 {
        tie_groups(values)
            .into_iter()
            .filter(|t| *t > 1)
            .map(|t| {
                let t = t as f64;
                t * (t - 1.0) * (2.0 * t + 5.0)
            })
            .sum()
    };
    let sigma_sq = (n * (n - 1.0) * (2.0 * n + 5.0) - tie_term(x) - tie_term(y)) / 18.0;
    let sigma = sigma_sq.max(0.0).sqrt();
    // Negative for any confidence above one half.
    let z = normal_ppf((1.0 - confidence) / 2.0);

    let last = (nt - 1) as f64;
    let upper = ((nt as f64 - z * sigma) / 2.0)
        .round_ties_even()
        .clamp(0.0, last);
    let lower = (((nt as f64 + z * sigma) / 2.0).round_ties_even() - 1.0).clamp(0.0, last);
    (sorted_slopes[lower as usize], sorted_slopes[upper as usize])
}
