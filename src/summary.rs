//! Descriptive statistics over the daily variables.

use crate::math::percentile::{percentile_sorted, sorted_finite};
use crate::metrics::{ANOMALY_COLUMN, STORM_INDEX_COLUMN, TEMP_RANGE_COLUMN};
use crate::types::daily_frame::DailyFrame;
use crate::types::variable::Variable;
use crate::ClimateError;
use polars::prelude::{Column, DataFrame, NamedFrom};
use serde::{Deserialize, Serialize};

/// Derived columns [`describe`] summarises when present, after the
/// [`Variable`] columns.
pub const DERIVED_COLUMNS: [&str; 3] = [TEMP_RANGE_COLUMN, ANOMALY_COLUMN, STORM_INDEX_COLUMN];

/// Summary of one column's non-missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator); NaN for one value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarises every variable and derived column present in `frame` that has
/// at least one value.
pub fn describe(frame: &DailyFrame) -> Result<Vec<ColumnSummary>, ClimateError> {
    let columns: Vec<&str> = Variable::ALL
        .iter()
        .map(|v| v.column_name())
        .chain(DERIVED_COLUMNS)
        .collect();
    describe_columns(frame, &columns)
}

/// Summarises the named numeric columns, in order. Absent and all-missing
/// columns are skipped.
///
/// # Errors
///
/// Returns [`ClimateError::ColumnType`] if a named column is not numeric.
pub fn describe_columns(
    frame: &DailyFrame,
    columns: &[&str],
) -> Result<Vec<ColumnSummary>, ClimateError> {
    let mut summaries = Vec::new();
    for &column in columns {
        let Some(values) = frame.named_values(column)? else {
            continue;
        };
        let sorted = sorted_finite(&values);
        let (Some(min), Some(max)) = (sorted.first().copied(), sorted.last().copied()) else {
            continue;
        };
        let quantile = |q: f64| percentile_sorted(&sorted, q).unwrap_or(f64::NAN);
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let ss = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        summaries.push(ColumnSummary {
            column: column.to_string(),
            count: sorted.len(),
            mean,
            std: (ss / (n - 1.0)).sqrt(),
            min,
            q25: quantile(25.0),
            median: quantile(50.0),
            q75: quantile(75.0),
            max,
        });
    }
    Ok(summaries)
}

/// Biased (Fisher-Pearson) sample skewness `m3 / m2^1.5`, ignoring NaNs and
/// infinities.
///
/// `None` for fewer than 3 values or values without spread.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if data.len() < 3 {
        return None;
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let m2 = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = data.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

/// Pairwise Pearson correlations between the variables of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub variables: Vec<Variable>,
    /// Row-major, `variables.len()` squared entries.
    pub values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Variable, b: Variable) -> Option<f64> {
        let i = self.variables.iter().position(|v| *v == a)?;
        let j = self.variables.iter().position(|v| *v == b)?;
        self.values.get(i * self.variables.len() + j).copied()
    }

    /// The matrix as a table: a `variable` label column followed by one
    /// column per variable.
    pub fn to_frame(&self) -> Result<DataFrame, ClimateError> {
        let k = self.variables.len();
        let mut columns = vec![Column::new(
            "variable".into(),
            self.variables
                .iter()
                .map(|v| v.column_name())
                .collect::<Vec<_>>(),
        )];
        for (j, variable) in self.variables.iter().enumerate() {
            let column: Vec<f64> = (0..k).map(|i| self.values[i * k + j]).collect();
            columns.push(Column::new(variable.column_name().into(), column));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Pearson correlation of every pair of present variables, each computed on
/// the rows where both are observed. Undefined pairs (fewer than two shared
/// rows, or no spread) are NaN.
pub fn correlation_matrix(frame: &DailyFrame) -> Result<CorrelationMatrix, ClimateError> {
    let mut variables = Vec::new();
    let mut columns = Vec::new();
    for variable in Variable::ALL {
        if let Some(column) = frame.column_values(variable)? {
            variables.push(variable);
            columns.push(column);
        }
    }
    let k = variables.len();
    let mut values = vec![f64::NAN; k * k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&columns[i], &columns[j]);
            values[i * k + j] = r;
            values[j * k + i] = r;
        }
    }
    Ok(CorrelationMatrix { variables, values })
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}
