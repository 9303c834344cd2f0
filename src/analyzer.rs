//! The entry point tying the analyses to one station's daily record.

use crate::config::AnalysisConfig;
use crate::extremes::gev::GevParams;
use crate::extremes::select::select_extremes;
use crate::extremes::sensitivity::{sensitivity, SensitivityRow};
use crate::extremes::tail_fit::{fit_tails, TailFit, TailFits};
use crate::extremes::{Tail, TailSamples};
use crate::metrics::{baseline_anomaly, storm_index, temp_range};
use crate::summary::{correlation_matrix, describe, ColumnSummary, CorrelationMatrix};
use crate::trend::{trend_test_series, TrendOptions, TrendResult};
use crate::types::daily_frame::DailyFrame;
use crate::types::variable::Variable;
use crate::ClimateError;
use bon::bon;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Runs the trend, extremes and sensitivity analyses over a [`DailyFrame`].
///
/// Per-call settings fall back to the [`AnalysisConfig`] the analyzer was
/// created with.
///
/// # Examples
///
/// ```
/// use climatrend::{ClimateAnalyzer, DailyFrame, Trend, Variable};
/// use polars::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tavg: Vec<f64> = (0..12).map(|d| 10.0 + 0.1 * f64::from(d)).collect();
/// let analyzer = ClimateAnalyzer::new(DailyFrame::new(df!("tavg" => tavg)?));
///
/// let result = analyzer.trend(Variable::TempAvg).call()?.unwrap();
/// assert_eq!(result.trend, Trend::Increasing);
///
/// // Stricter significance for this call only.
/// let strict = analyzer.trend(Variable::TempAvg).alpha(1e-9).call()?.unwrap();
/// assert_eq!(strict.trend, Trend::NoTrend);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClimateAnalyzer {
    daily: DailyFrame,
    config: AnalysisConfig,
}

#[bon]
impl ClimateAnalyzer {
    /// Creates an analyzer with the default configuration.
    pub fn new(daily: DailyFrame) -> Self {
        Self {
            daily,
            config: AnalysisConfig::default(),
        }
    }

    /// Creates an analyzer with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error of `config`.
    pub fn with_config(daily: DailyFrame, config: AnalysisConfig) -> Result<Self, ClimateError> {
        config.validate()?;
        Ok(Self { daily, config })
    }

    pub fn daily(&self) -> &DailyFrame {
        &self.daily
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Tests `variable` for a monotonic trend over the record's dates.
    ///
    /// Returns `Ok(None)` when the variable is absent. The slope is per day
    /// when the frame has a `date` column, and per row otherwise.
    ///
    /// The cost is quadratic in the number of days, in time and in memory
    /// for the slope: decades of daily values need hundreds of megabytes.
    /// For long records, test monthly or annual means with
    /// [`crate::trend_test_series`] instead.
    ///
    /// # Errors
    ///
    /// * [`ClimateError::InsufficientData`] with fewer than 3 observations.
    /// * [`ClimateError::InvalidProbability`] for an out-of-range level.
    #[builder(start_fn = trend)]
    #[doc(hidden)]
    pub fn build_trend(
        &self,
        #[builder(start_fn)] variable: Variable,
        alpha: Option<f64>,
        confidence: Option<f64>,
    ) -> Result<Option<TrendResult>, ClimateError> {
        let options = TrendOptions {
            alpha: alpha.unwrap_or(self.config.trend.alpha),
            confidence: confidence.unwrap_or(self.config.trend.confidence),
        };
        let Some(series) = self.daily.series(variable)? else {
            warn!("Column '{}' missing, no trend computed", variable);
            return Ok(None);
        };
        trend_test_series(&series, &options).map(Some)
    }

    /// Selects the cold and heat tails at the given percentile cutoffs.
    #[builder]
    pub fn extremes(
        &self,
        p_low: Option<f64>,
        p_high: Option<f64>,
    ) -> Result<TailSamples, ClimateError> {
        select_extremes(
            &self.daily,
            p_low.unwrap_or(self.config.p_low),
            p_high.unwrap_or(self.config.p_high),
        )
    }

    /// Tail sizes over a grid of percentile cutoffs.
    #[builder]
    pub fn sensitivity(
        &self,
        low_cutoffs: Option<&[f64]>,
        high_cutoffs: Option<&[f64]>,
    ) -> Result<Vec<SensitivityRow>, ClimateError> {
        sensitivity(
            &self.daily,
            low_cutoffs.unwrap_or(&self.config.low_cutoffs),
            high_cutoffs.unwrap_or(&self.config.high_cutoffs),
        )
    }

    /// Selects both tails at the configured cutoffs and fits a GEV to each,
    /// concurrently.
    pub async fn fit_tails(&self) -> Result<(TailSamples, TailFits), ClimateError> {
        let samples = self.extremes().call()?;
        let fits = fit_tails(samples.clone()).await?;
        Ok((samples, fits))
    }

    /// Tail sizes, fits and return levels at the configured return period.
    pub async fn extremes_report(&self) -> Result<ExtremesReport, ClimateError> {
        let (samples, fits) = self.fit_tails().await?;
        let period = self.config.return_period;
        let summarize = |tail: Tail| -> Result<TailReport, ClimateError> {
            let sample = samples.get(tail);
            let fit = fits.get(tail);
            Ok(TailReport {
                tail,
                threshold: sample.threshold,
                sample_size: sample.len(),
                params: fit.map(|f| f.params),
                return_level: fit.map(|f| f.return_level(period)).transpose()?,
            })
        };
        let report = ExtremesReport {
            return_period: period,
            heat: summarize(Tail::Heat)?,
            cold: summarize(Tail::Cold)?,
        };
        info!(
            "Extremes report: {} heat and {} cold values",
            report.heat.sample_size, report.cold.sample_size
        );
        Ok(report)
    }

    /// The record with `tavg_anom` added, against the configured baseline.
    pub fn anomalies(&self) -> Result<DailyFrame, ClimateError> {
        baseline_anomaly(&self.daily, self.config.baseline_years)
    }

    /// The record with `storm_index` added, using the configured weights.
    pub fn storm_index(&self) -> Result<DailyFrame, ClimateError> {
        let (w_gust, w_precip) = self.config.storm_weights;
        storm_index(&self.daily, w_gust, w_precip)
    }

    /// The record with `temp_range` added.
    pub fn temp_range(&self) -> Result<DailyFrame, ClimateError> {
        temp_range(&self.daily)
    }

    /// Summaries of the variables, the temperature range and the storm index.
    pub fn describe(&self) -> Result<Vec<ColumnSummary>, ClimateError> {
        let (w_gust, w_precip) = self.config.storm_weights;
        let derived = storm_index(&temp_range(&self.daily)?, w_gust, w_precip)?;
        describe(&derived)
    }

    pub fn correlations(&self) -> Result<CorrelationMatrix, ClimateError> {
        correlation_matrix(&self.daily)
    }
}

/// Extremes findings for one tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailReport {
    pub tail: Tail,
    pub threshold: Option<f64>,
    pub sample_size: usize,
    /// Fitted parameters; negated space for the cold tail.
    pub params: Option<GevParams>,
    /// Return level in original units.
    pub return_level: Option<f64>,
}

impl TailReport {
    fn summary_line(&self, period_years: f64) -> String {
        let label = match self.tail {
            Tail::Heat => "Heat",
            Tail::Cold => "Cold",
        };
        match self.return_level {
            Some(level) => format!(
                "{} extremes (GEV) ~{}-year return level {}: {:.2} °C",
                label,
                format_years(period_years),
                self.tail.variable(),
                level
            ),
            None => format!("{} extremes: insufficient data for GEV fit.", label),
        }
    }
}

/// Heat and cold findings of [`ClimateAnalyzer::extremes_report`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtremesReport {
    /// Return period in days.
    pub return_period: f64,
    pub heat: TailReport,
    pub cold: TailReport,
}

impl ExtremesReport {
    /// One human-readable line per tail, heat first.
    pub fn summary_lines(&self) -> Vec<String> {
        let years = self.return_period / 365.25;
        vec![
            self.heat.summary_line(years),
            self.cold.summary_line(years),
        ]
    }

    pub fn fit(&self, tail: Tail) -> Option<TailFit> {
        let report = match tail {
            Tail::Heat => &self.heat,
            Tail::Cold => &self.cold,
        };
        report.params.map(|params| TailFit { tail, params })
    }
}

fn format_years(years: f64) -> String {
    if years.fract() == 0.0 {
        format!("{}", years as i64)
    } else {
        format!("{:.1}", years)
    }
}
