//! GEV fits of tail samples, tracking the negated space cold fits live in.

use crate::extremes::gev::{fit_gev_values, GevParams};
use crate::extremes::{Tail, TailSample, TailSamples};
use crate::ClimateError;
use log::info;
use serde::{Deserialize, Serialize};

/// Fits a GEV to `sample` by maximum likelihood.
///
/// Heat samples are fitted on their raw values. Cold samples are fitted on
/// the negated values, so minima become maxima; the returned parameters then
/// describe `-x`. Use [`TailFit`] to get results back in original units.
///
/// Returns `None` for samples with fewer than 10 values.
pub fn fit_gev(sample: &TailSample) -> Option<GevParams> {
    match sample.tail {
        Tail::Heat => fit_gev_values(&sample.values),
        Tail::Cold => {
            let negated: Vec<f64> = sample.values.iter().map(|v| -v).collect();
            fit_gev_values(&negated)
        }
    }
}

/// A GEV fitted to one tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailFit {
    pub tail: Tail,
    /// Parameters in the fitted space: raw for heat, negated for cold.
    pub params: GevParams,
}

impl TailFit {
    /// Fits `sample`; `None` when the fit is declined.
    pub fn fit(sample: &TailSample) -> Option<TailFit> {
        let params = fit_gev(sample);
        if params.is_none() {
            info!(
                "No GEV fit for {} tail ({} values)",
                sample.tail,
                sample.len()
            );
        }
        params.map(|params| TailFit {
            tail: sample.tail,
            params,
        })
    }

    /// Return level at `period` in original units.
    ///
    /// For a cold tail this is the low temperature reached on average once
    /// every `period` time units.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::InvalidReturnPeriod`] unless `period > 1`.
    pub fn return_level(&self, period: f64) -> Result<f64, ClimateError> {
        let level = self.params.return_level(period)?;
        Ok(match self.tail {
            Tail::Heat => level,
            Tail::Cold => -level,
        })
    }

    /// Density at each of `xs`, in original units.
    pub fn density(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter()
            .map(|x| match self.tail {
                Tail::Heat => self.params.pdf(*x),
                Tail::Cold => self.params.pdf(-x),
            })
            .collect()
    }

    /// `points` evenly spaced `(x, density)` pairs spanning the range of
    /// `sample`, for overlaying the fit on a histogram.
    pub fn density_curve(&self, sample: &TailSample, points: usize) -> Vec<(f64, f64)> {
        let Some((lo, hi)) = sample.range() else {
            return Vec::new();
        };
        let xs = linspace(lo, hi, points);
        let ys = self.density(&xs);
        xs.into_iter().zip(ys).collect()
    }
}

fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points)
                .map(|i| {
                    if i == points - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Heat and cold fits of one selection. A tail is `None` when its fit was
/// declined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailFits {
    pub cold: Option<TailFit>,
    pub heat: Option<TailFit>,
}

impl TailFits {
    pub fn get(&self, tail: Tail) -> Option<&TailFit> {
        match tail {
            Tail::Cold => self.cold.as_ref(),
            Tail::Heat => self.heat.as_ref(),
        }
    }
}

/// Fits both tails of `samples` concurrently on the blocking thread pool.
///
/// # Errors
///
/// Returns [`ClimateError::TaskJoin`] if a fitting task panics.
pub async fn fit_tails(samples: TailSamples) -> Result<TailFits, ClimateError> {
    let TailSamples { cold, heat } = samples;
    let cold_task = tokio::task::spawn_blocking(move || TailFit::fit(&cold));
    let heat_task = tokio::task::spawn_blocking(move || TailFit::fit(&heat));
    let (cold, heat) = tokio::try_join!(cold_task, heat_task)?;
    Ok(TailFits { cold, heat })
}
