//! Monotonic trend detection: the Mann-Kendall significance test paired with
//! a Theil-Sen slope estimate over the same `(time index, value)` points.

mod kendall;
mod mann_kendall;
mod theil_sen;

use crate::types::time_series::TimeSeries;
use crate::ClimateError;
use kendall::kendall_tau;
use log::info;
use mann_kendall::{mann_kendall, MannKendall};
use serde::{Deserialize, Serialize};
use std::fmt;
use theil_sen::theil_sen;

/// Fewest non-missing values the test accepts at all.
pub const MIN_TREND_VALUES: usize = 3;

/// Below this many values the significance test is floored to "no trend",
/// since the normal approximation of S is unreliable.
pub const MIN_SIGNIFICANCE_VALUES: usize = 8;

/// Direction of a significant monotonic trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "increasing")]
    Increasing,
    #[serde(rename = "decreasing")]
    Decreasing,
    #[serde(rename = "no trend")]
    NoTrend,
}

impl Trend {
    fn classify(z: f64, p: f64, alpha: f64) -> Trend {
        if p < alpha && z > 0.0 {
            Trend::Increasing
        } else if p < alpha && z < 0.0 {
            Trend::Decreasing
        } else {
            Trend::NoTrend
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::NoTrend => "no trend",
        };
        write!(f, "{}", label)
    }
}

/// Outcome of [`trend_test`] or [`trend_test_series`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Number of non-missing values tested.
    pub n: usize,
    /// Mann-Kendall S statistic.
    pub s: i64,
    /// Tie-corrected variance of S.
    pub var_s: f64,
    /// Continuity-corrected normal score.
    pub z: f64,
    /// Two-sided p-value.
    pub p: f64,
    /// Kendall's tau-b between time index and value. Unaffected by the
    /// small-sample floor; NaN when either is constant.
    pub kendall_tau: f64,
    /// Two-sided p-value of `kendall_tau`: exact for untied samples of up to
    /// 33 values, normal approximation otherwise.
    pub kendall_p: f64,
    /// Theil-Sen slope, in value units per time-index unit.
    pub slope: f64,
    pub intercept: f64,
    /// Lower confidence bound of the slope.
    pub lcl: f64,
    /// Upper confidence bound of the slope.
    pub ucl: f64,
    pub trend: Trend,
}

/// Tuning for the trend test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct TrendOptions {
    /// Significance level for the trend label.
    #[builder(default = 0.05)]
    pub alpha: f64,
    /// Confidence level of the Theil-Sen slope interval.
    #[builder(default = 0.95)]
    pub confidence: f64,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            confidence: 0.95,
        }
    }
}

impl TrendOptions {
    /// Checks that both levels lie strictly between 0 and 1.
    pub fn validate(&self) -> Result<(), ClimateError> {
        check_probability("alpha", self.alpha)?;
        check_probability("confidence", self.confidence)
    }
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ClimateError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ClimateError::InvalidProbability { name, value })
    }
}

/// Tests `values` for a monotonic trend at significance `alpha`.
///
/// NaNs and infinities are removed first and the remaining values are
/// indexed by position, so the slope is in units per observation.
///
/// # Errors
///
/// * [`ClimateError::InsufficientData`] with fewer than 3 non-missing values.
/// * [`ClimateError::InvalidProbability`] if `alpha` is not in `(0, 1)`.
///
/// # Example
///
/// ```
/// use climatrend::{trend_test, Trend};
///
/// # fn main() -> Result<(), climatrend::ClimateError> {
/// let values: Vec<f64> = (0..10).map(f64::from).collect();
/// let result = trend_test(&values, 0.05)?;
/// assert_eq!(result.trend, Trend::Increasing);
/// assert!((result.slope - 1.0).abs() < 1e-12);
/// # Ok(())
/// # }
/// ```
pub fn trend_test(values: &[f64], alpha: f64) -> Result<TrendResult, ClimateError> {
    let observed: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let options = TrendOptions {
        alpha,
        ..TrendOptions::default()
    };
    trend_test_series(&TimeSeries::from_values(&observed), &options)
}

/// Tests a [`TimeSeries`] for a monotonic trend, using the series' own time
/// index for the Theil-Sen slope. Missing points are skipped.
///
/// With fewer than 8 values the significance test is not computed: the
/// result reports `S = 0`, `var_s = 0`, `Z = 0`, `p = 1` and
/// [`Trend::NoTrend`], while the slope and Kendall's tau are still estimated.
///
/// Both the test and the slope visit every pair of points, and the slope
/// keeps all `n(n-1)/2` pairwise slopes in memory: about 480 MB for 30 years
/// of daily values. Long records are better tested as monthly or annual
/// means, indexed by month or year:
///
/// ```
/// use climatrend::{trend_test_series, TimeSeries, TrendOptions};
///
/// # fn main() -> Result<(), climatrend::ClimateError> {
/// let annual_means = [9.1, 9.4, 9.2, 9.8, 9.7, 10.1];
/// let series = TimeSeries::from_pairs(
///     (2015..).zip(annual_means.iter().map(|v| Some(*v))),
/// )?;
/// let result = trend_test_series(&series, &TrendOptions::default())?;
/// // Per year; too few years for the significance test, not for tau.
/// assert!(result.slope > 0.0);
/// assert!(result.kendall_tau > 0.7);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// * [`ClimateError::InsufficientData`] with fewer than 3 non-missing values,
///   or when every point shares the same time index.
/// * [`ClimateError::InvalidProbability`] for out-of-range options.
pub fn trend_test_series(
    series: &TimeSeries,
    options: &TrendOptions,
) -> Result<TrendResult, ClimateError> {
    options.validate()?;
    let (x, y): (Vec<f64>, Vec<f64>) = series.observed().map(|(i, v)| (i as f64, v)).unzip();
    let n = y.len();
    if n < MIN_TREND_VALUES {
        return Err(ClimateError::InsufficientData {
            required: MIN_TREND_VALUES,
            found: n,
        });
    }

    let fit = theil_sen(&x, &y, options.confidence).ok_or(ClimateError::InsufficientData {
        required: 2,
        found: 1,
    })?;

    let stats = if n < MIN_SIGNIFICANCE_VALUES {
        info!(
            "Only {} values, below the {} needed for the normal approximation; reporting no trend",
            n, MIN_SIGNIFICANCE_VALUES
        );
        MannKendall::FLOORED
    } else {
        mann_kendall(&y)
    };

    let kendall = kendall_tau(&x, &y);
    Ok(TrendResult {
        n,
        s: stats.s,
        var_s: stats.var_s,
        z: stats.z,
        p: stats.p,
        kendall_tau: kendall.tau,
        kendall_p: kendall.p,
        slope: fit.slope,
        intercept: fit.intercept,
        lcl: fit.lcl,
        ucl: fit.ucl,
        trend: Trend::classify(stats.z, stats.p, options.alpha),
    })
}
