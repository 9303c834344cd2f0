//! Settings for a full analysis run.

use crate::extremes::select::check_percentile;
use crate::extremes::sensitivity::{DEFAULT_HIGH_CUTOFFS, DEFAULT_LOW_CUTOFFS};
use crate::trend::TrendOptions;
use crate::ClimateError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Five years, in days: the default return period for daily tail samples.
pub const DEFAULT_RETURN_PERIOD: f64 = 5.0 * 365.25;

/// Every tunable of [`crate::ClimateAnalyzer`].
///
/// Missing fields take their defaults when deserialising, so a config file
/// only needs to name what it changes.
///
/// # Examples
///
/// ```
/// use climatrend::AnalysisConfig;
///
/// # fn main() -> Result<(), climatrend::ClimateError> {
/// let config = AnalysisConfig::from_json_str(r#"{ "p_high": 99.0 }"#)?;
/// assert_eq!(config.p_high, 99.0);
/// assert_eq!(config.p_low, 5.0);
///
/// let built = AnalysisConfig::builder().p_low(1.0).build();
/// assert_eq!(built.trend.alpha, 0.05);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct AnalysisConfig {
    #[builder(default)]
    pub trend: TrendOptions,
    /// Percentile cutoff of the cold tail.
    #[builder(default = 5.0)]
    pub p_low: f64,
    /// Percentile cutoff of the heat tail.
    #[builder(default = 95.0)]
    pub p_high: f64,
    #[builder(default = DEFAULT_LOW_CUTOFFS.to_vec())]
    pub low_cutoffs: Vec<f64>,
    #[builder(default = DEFAULT_HIGH_CUTOFFS.to_vec())]
    pub high_cutoffs: Vec<f64>,
    /// Return period for reported return levels, in the sample's time unit.
    #[builder(default = DEFAULT_RETURN_PERIOD)]
    pub return_period: f64,
    /// Inclusive range of years the anomaly climatology is built from.
    #[builder(default = (2020, 2021))]
    pub baseline_years: (i32, i32),
    /// Weights of gust and precipitation in the storm index.
    #[builder(default = (0.6, 0.4))]
    pub storm_weights: (f64, f64),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AnalysisConfig {
    /// Parses a JSON config and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ClimateError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClimateError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ClimateError::ConfigRead(path.to_path_buf(), e))?;
        Self::from_json_str(&json)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// * [`ClimateError::InvalidProbability`] for bad trend options.
    /// * [`ClimateError::InvalidPercentile`] for a cutoff outside `[0, 100]`.
    /// * [`ClimateError::InvalidReturnPeriod`] unless the period exceeds 1.
    /// * [`ClimateError::InvalidWeights`] for negative or non-finite weights.
    pub fn validate(&self) -> Result<(), ClimateError> {
        self.trend.validate()?;
        for q in [self.p_low, self.p_high]
            .iter()
            .chain(&self.low_cutoffs)
            .chain(&self.high_cutoffs)
        {
            check_percentile(*q)?;
        }
        if self.return_period.is_nan() || self.return_period <= 1.0 {
            return Err(ClimateError::InvalidReturnPeriod(self.return_period));
        }
        let (w_gust, w_precip) = self.storm_weights;
        if !(w_gust.is_finite() && w_precip.is_finite() && w_gust >= 0.0 && w_precip >= 0.0) {
            return Err(ClimateError::InvalidWeights(w_gust, w_precip));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() -> Result<(), ClimateError> {
        let config = AnalysisConfig::default();
        config.validate()?;
        assert_eq!(config.low_cutoffs, vec![1.0, 2.0, 5.0, 10.0]);
        assert_eq!(config.high_cutoffs, vec![90.0, 95.0, 98.0, 99.0]);
        assert_eq!(config.return_period, 1826.25);
        assert_eq!(config.baseline_years, (2020, 2021));
        Ok(())
    }

    #[test]
    fn partial_json_keeps_defaults() -> Result<(), ClimateError> {
        let config = AnalysisConfig::from_json_str(
            r#"{ "trend": { "alpha": 0.1 }, "baseline_years": [1991, 2020] }"#,
        )?;
        assert_eq!(config.trend.alpha, 0.1);
        assert_eq!(config.trend.confidence, 0.95);
        assert_eq!(config.baseline_years, (1991, 2020));
        assert_eq!(config.p_high, 95.0);
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{ "p_low": 150 }"#),
            Err(ClimateError::InvalidPercentile(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{ "return_period": 0.5 }"#),
            Err(ClimateError::InvalidReturnPeriod(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{ "storm_weights": [-1, 0.4] }"#),
            Err(ClimateError::InvalidWeights(..))
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str("{ not json"),
            Err(ClimateError::ConfigParse(_))
        ));
    }

    #[test]
    fn reads_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "high_cutoffs": [97.5] }}"#)?;
        let config = AnalysisConfig::from_path(file.path())?;
        assert_eq!(config.high_cutoffs, vec![97.5]);

        let missing = AnalysisConfig::from_path("/definitely/not/here.json");
        assert!(matches!(missing, Err(ClimateError::ConfigRead(..))));
        Ok(())
    }
}
