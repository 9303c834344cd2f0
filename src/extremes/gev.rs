//! Generalized Extreme Value distribution and its maximum-likelihood fit.
//!
//! Parameterised by shape `c`, location `loc` and scale `scale` with
//! `F(x) = exp(-(1 - c z)^(1/c))`, `z = (x - loc) / scale`, on the support
//! `1 - c z > 0`. `c = 0` is the Gumbel limit `F(x) = exp(-exp(-z))`. With this
//! sign convention `c > 0` gives a bounded upper tail and `c < 0` a heavy one.

use crate::math::optimize::NelderMead;
use crate::ClimateError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Fewest values [`fit_gev_values`] will fit.
pub const MIN_GEV_SAMPLE: usize = 10;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Fitted GEV parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GevParams {
    /// Shape.
    pub c: f64,
    pub loc: f64,
    /// Scale, always positive for a fitted distribution.
    pub scale: f64,
}

impl GevParams {
    pub fn new(c: f64, loc: f64, scale: f64) -> Self {
        Self { c, loc, scale }
    }

    /// Support of the distribution as `(lower, upper)`.
    pub fn support(&self) -> (f64, f64) {
        let bound = self.loc + self.scale / self.c;
        if self.c > 0.0 {
            (f64::NEG_INFINITY, bound)
        } else if self.c < 0.0 {
            (bound, f64::INFINITY)
        } else {
            (f64::NEG_INFINITY, f64::INFINITY)
        }
    }

    /// `ln(1 - c z)`, or `None` outside the support.
    fn log_t(&self, z: f64) -> Option<f64> {
        let t = -self.c * z;
        if t <= -1.0 {
            None
        } else {
            Some(t.ln_1p())
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        let z = (x - self.loc) / self.scale;
        if self.c == 0.0 {
            return (-(-z).exp()).exp();
        }
        match self.log_t(z) {
            Some(log_t) => (-(log_t / self.c).exp()).exp(),
            None if self.c > 0.0 => 1.0,
            None => 0.0,
        }
    }

    /// Log density; `-inf` outside the support.
    pub fn log_pdf(&self, x: f64) -> f64 {
        if self.scale <= 0.0 || x.is_nan() {
            return f64::NAN;
        }
        let z = (x - self.loc) / self.scale;
        if self.c == 0.0 {
            return -self.scale.ln() - z - (-z).exp();
        }
        match self.log_t(z) {
            Some(log_t) => {
                -self.scale.ln() + (1.0 / self.c - 1.0) * log_t - (log_t / self.c).exp()
            }
            None => f64::NEG_INFINITY,
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.log_pdf(x).exp()
    }

    /// Quantile function. `NaN` for `p` outside `[0, 1]`.
    pub fn ppf(&self, p: f64) -> f64 {
        if !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        let log_y = (-p.ln()).ln();
        if self.c == 0.0 {
            self.loc - self.scale * log_y
        } else {
            self.loc - self.scale * (self.c * log_y).exp_m1() / self.c
        }
    }

    /// The level exceeded on average once every `period` time units, the
    /// quantile at non-exceedance probability `1 - 1/period`.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::InvalidReturnPeriod`] unless `period > 1`.
    pub fn return_level(&self, period: f64) -> Result<f64, ClimateError> {
        if period.is_nan() || period <= 1.0 {
            return Err(ClimateError::InvalidReturnPeriod(period));
        }
        Ok(self.ppf(1.0 - 1.0 / period))
    }

    /// Negative log-likelihood of `data`; `+inf` if any value lies outside
    /// the support.
    pub fn nll(&self, data: &[f64]) -> f64 {
        if !(self.scale > 0.0) {
            return f64::INFINITY;
        }
        let mut total = 0.0;
        for x in data {
            let lp = self.log_pdf(*x);
            if !lp.is_finite() {
                return f64::INFINITY;
            }
            total -= lp;
        }
        total
    }
}

/// Return level of `params` at `period`; see [`GevParams::return_level`].
pub fn return_level(params: &GevParams, period: f64) -> Result<f64, ClimateError> {
    params.return_level(period)
}

/// Density of `params` evaluated at every point of `xs`.
pub fn pdf(params: &GevParams, xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|x| params.pdf(*x)).collect()
}

/// Fits a GEV to `values` by maximum likelihood.
///
/// Non-finite values are dropped first. Returns `None` when fewer than
/// [`MIN_GEV_SAMPLE`] values remain, when the values have no spread, or when
/// no parameter set with a finite likelihood is found.
pub fn fit_gev_values(values: &[f64]) -> Option<GevParams> {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if data.len() < MIN_GEV_SAMPLE {
        debug!(
            "GEV fit declined: {} values, at least {} required",
            data.len(),
            MIN_GEV_SAMPLE
        );
        return None;
    }

    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let m2 = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let m3 = data.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / n;
    let std = (m2 * n / (n - 1.0)).sqrt();
    if !(std > 0.0) || !std.is_finite() {
        warn!("GEV fit declined: sample of {} values has no spread", data.len());
        return None;
    }

    // Gumbel method of moments.
    let scale0 = std * 6f64.sqrt() / PI;
    let loc0 = mean - EULER_GAMMA * scale0;
    let shape_guess = if m3 < 0.0 { 0.1 } else { -0.1 };

    let objective = |p: &[f64]| GevParams::new(p[0], p[1], p[2].exp()).nll(&data);
    let steps = [0.1, 0.5 * scale0, 0.1];
    let optimizer = NelderMead::default();

    let mut best: Option<(Vec<f64>, f64)> = None;
    for start in [[0.0, loc0, scale0.ln()], [shape_guess, loc0, scale0.ln()]] {
        if !objective(&start[..]).is_finite() {
            debug!("Skipping infeasible GEV start {:?}", start);
            continue;
        }
        let first = optimizer.minimize(objective, &start, &steps);
        // A restart from the first optimum recovers from a collapsed simplex.
        let polished = optimizer.minimize(objective, &first.point, &steps);
        if best
            .as_ref()
            .map_or(true, |(_, value)| polished.value < *value)
        {
            best = Some((polished.point, polished.value));
        }
    }

    let (point, value) = best?;
    let params = GevParams::new(point[0], point[1], point[2].exp());
    if !value.is_finite() || !params.scale.is_finite() || params.scale <= 0.0 {
        warn!("GEV fit failed to find a finite likelihood");
        return None;
    }
    debug!(
        "GEV fit on {} values: c = {:.4}, loc = {:.4}, scale = {:.4}, nll = {:.4}",
        data.len(),
        params.c,
        params.loc,
        params.scale,
        value
    );
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantile_sample(params: &GevParams, n: usize) -> Vec<f64> {
        (1..=n)
            .map(|i| params.ppf((i as f64 - 0.5) / n as f64))
            .collect()
    }

    #[test]
    fn gumbel_reference_values() {
        let gumbel = GevParams::new(0.0, 0.0, 1.0);
        assert!((gumbel.cdf(0.0) - (-1f64).exp()).abs() < 1e-15);
        assert!((gumbel.pdf(0.0) - (-1f64).exp()).abs() < 1e-15);
        // Median of the standard Gumbel: -ln(ln 2)
        assert!((gumbel.ppf(0.5) + 2f64.ln().ln()).abs() < 1e-15);
    }

    #[test]
    fn shape_sign_controls_support() {
        let bounded = GevParams::new(0.5, 10.0, 2.0);
        assert_eq!(bounded.support(), (f64::NEG_INFINITY, 14.0));
        assert_eq!(bounded.cdf(15.0), 1.0);
        assert_eq!(bounded.pdf(15.0), 0.0);

        let heavy = GevParams::new(-0.5, 10.0, 2.0);
        assert_eq!(heavy.support(), (6.0, f64::INFINITY));
        assert_eq!(heavy.cdf(5.0), 0.0);
        assert_eq!(heavy.log_pdf(5.0), f64::NEG_INFINITY);
    }

    #[test]
    fn ppf_inverts_cdf() {
        for params in [
            GevParams::new(0.2, 25.0, 3.0),
            GevParams::new(-0.3, -4.0, 1.5),
            GevParams::new(0.0, 1.0, 0.5),
            GevParams::new(1e-9, 1.0, 0.5),
        ] {
            for p in [0.01, 0.1, 0.5, 0.9, 0.999] {
                let x = params.ppf(p);
                assert!((params.cdf(x) - p).abs() < 1e-12, "{:?} at {}", params, p);
            }
        }
    }

    #[test]
    fn ppf_endpoints() {
        let heavy = GevParams::new(-0.5, 10.0, 2.0);
        assert_eq!(heavy.ppf(0.0), 6.0);
        assert_eq!(heavy.ppf(1.0), f64::INFINITY);
        assert!(heavy.ppf(1.5).is_nan());
    }

    #[test]
    fn pdf_integrates_to_one() {
        let params = GevParams::new(0.15, 30.0, 2.0);
        let (lo, hi) = (params.ppf(1e-9), params.ppf(1.0 - 1e-12));
        let steps = 20_000;
        let h = (hi - lo) / steps as f64;
        let area: f64 = (0..steps)
            .map(|i| params.pdf(lo + (i as f64 + 0.5) * h) * h)
            .sum();
        assert!((area - 1.0).abs() < 1e-4, "area {}", area);
    }

    #[test]
    fn return_level_requires_period_above_one() {
        let params = GevParams::new(0.1, 30.0, 2.0);
        assert!(matches!(
            params.return_level(1.0),
            Err(ClimateError::InvalidReturnPeriod(_))
        ));
        assert!(params.return_level(f64::NAN).is_err());
        let level = return_level(&params, 10.0).unwrap();
        assert!((params.cdf(level) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn pdf_over_grid() {
        let params = GevParams::new(0.0, 0.0, 1.0);
        let ys = pdf(&params, &[-1.0, 0.0, 1.0]);
        assert_eq!(ys.len(), 3);
        assert!(ys[1] > ys[0] && ys[1] > ys[2]);
    }

    #[test]
    fn declines_small_and_flat_samples() {
        assert_eq!(fit_gev_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]), None);
        assert_eq!(fit_gev_values(&[3.0; 25]), None);
        let mut with_nan: Vec<f64> = (0..9).map(f64::from).collect();
        with_nan.push(f64::NAN);
        assert_eq!(fit_gev_values(&with_nan), None);
    }

    #[test]
    fn recovers_parameters() {
        let truth = GevParams::new(0.1, 30.0, 2.0);
        let data = quantile_sample(&truth, 500);
        let fit = fit_gev_values(&data).unwrap();
        assert!((fit.c - truth.c).abs() < 0.05, "{:?}", fit);
        assert!((fit.loc - truth.loc).abs() < 0.2, "{:?}", fit);
        assert!((fit.scale - truth.scale).abs() < 0.2, "{:?}", fit);
        assert!(fit.nll(&data) <= truth.nll(&data) + 1e-6);
    }

    #[test]
    fn recovers_heavy_tail() {
        let truth = GevParams::new(-0.2, 5.0, 1.0);
        let data = quantile_sample(&truth, 400);
        let fit = fit_gev_values(&data).unwrap();
        assert!(fit.c < 0.0, "{:?}", fit);
        assert!(fit.nll(&data) <= truth.nll(&data) + 1e-6);
    }

    #[test]
    fn fit_is_deterministic() {
        let data: Vec<f64> = (0..40).map(|i| 20.0 + ((i * 37) % 17) as f64 * 0.3).collect();
        assert_eq!(fit_gev_values(&data), fit_gev_values(&data));
    }
}
