//! Contains the `TimeSeries` type: an ordered sequence of time-indexed values
//! with possibly missing observations.

use crate::ClimateError;
use chrono::{Datelike, NaiveDate};

/// An ordered sequence of `(time index, value)` pairs.
///
/// The time index is an integer that never decreases from one point to the
/// next (dates are stored as days since 0001-01-01). Missing values are kept
/// in place so the series stays aligned with its source, but every statistic
/// skips them; nothing is imputed. `NaN` and infinities are normalised to
/// missing on construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    index: Vec<i64>,
    values: Vec<Option<f64>>,
}

impl TimeSeries {
    /// Builds a series from plain values, indexed by position. `NaN` or an
    /// infinity marks a missing value.
    ///
    /// # Examples
    ///
    /// ```
    /// use climatrend::TimeSeries;
    ///
    /// let series = TimeSeries::from_values(&[1.0, f64::NAN, 3.0]);
    /// assert_eq!(series.len(), 3);
    /// assert_eq!(series.observed_values(), vec![1.0, 3.0]);
    /// ```
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            index: (0..values.len() as i64).collect(),
            values: values.iter().map(|v| normalise(Some(*v))).collect(),
        }
    }

    /// Builds a series from explicit `(index, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::UnorderedIndex`] if the index decreases anywhere.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (i64, Option<f64>)>,
    ) -> Result<Self, ClimateError> {
        let (index, values): (Vec<i64>, Vec<Option<f64>>) = pairs
            .into_iter()
            .map(|(i, v)| (i, normalise(v)))
            .unzip();
        if let Some(position) = index.windows(2).position(|w| w[1] < w[0]) {
            return Err(ClimateError::UnorderedIndex {
                position: position + 1,
            });
        }
        Ok(Self { index, values })
    }

    /// Builds a series indexed by calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::UnorderedIndex`] if the dates are not in
    /// non-decreasing order.
    pub fn from_dates(
        pairs: impl IntoIterator<Item = (NaiveDate, Option<f64>)>,
    ) -> Result<Self, ClimateError> {
        Self::from_pairs(
            pairs
                .into_iter()
                .map(|(date, v)| (i64::from(date.num_days_from_ce()), v)),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of missing points.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Iterates over the non-missing points in order.
    pub fn observed(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.index
            .iter()
            .zip(&self.values)
            .filter_map(|(i, v)| v.map(|v| (*i, v)))
    }

    /// The non-missing values in order.
    pub fn observed_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }
}

fn normalise(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
