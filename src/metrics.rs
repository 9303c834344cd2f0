//! Derived daily metrics: temperature anomalies against a day-of-year
//! climatology, the daily temperature range and a composite storm index.

use crate::types::daily_frame::DailyFrame;
use crate::types::variable::Variable;
use crate::ClimateError;
use log::{info, warn};
use polars::prelude::*;

/// Name of the column added by [`baseline_anomaly`].
pub const ANOMALY_COLUMN: &str = "tavg_anom";
/// Name of the column added by [`storm_index`].
pub const STORM_INDEX_COLUMN: &str = "storm_index";
/// Name of the column added by [`temp_range`].
pub const TEMP_RANGE_COLUMN: &str = "temp_range";

const ROW_INDEX: &str = "__row";
const DAY_OF_YEAR: &str = "__doy";
const CLIMATOLOGY: &str = "__clim";

/// Adds `tavg_anom`: each day's average temperature minus the mean for the
/// same day of year over `baseline_years` (inclusive).
///
/// Days whose day of year never occurs in the baseline get a null anomaly.
/// When the frame has no `tavg` column the anomaly column is entirely null.
///
/// # Errors
///
/// Returns [`ClimateError::Polars`] if the frame has no `date` column.
pub fn baseline_anomaly(
    frame: &DailyFrame,
    baseline_years: (i32, i32),
) -> Result<DailyFrame, ClimateError> {
    let mut df = frame.frame.clone();
    if !frame.has(Variable::TempAvg) {
        warn!("Column 'tavg' missing, anomalies are all null");
        df.with_column(Series::full_null(
            ANOMALY_COLUMN.into(),
            df.height(),
            &DataType::Float64,
        ))?;
        return Ok(DailyFrame::new(df));
    }

    let (start, end) = baseline_years;
    let tavg = col(Variable::TempAvg.column_name()).cast(DataType::Float64);
    let with_doy = df
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .with_column(col("date").dt().ordinal_day().alias(DAY_OF_YEAR));

    let year = col("date").dt().year();
    let climatology = with_doy
        .clone()
        .filter(year.clone().gt_eq(lit(start)).and(year.lt_eq(lit(end))))
        .group_by([col(DAY_OF_YEAR)])
        .agg([tavg.clone().mean().alias(CLIMATOLOGY)]);

    let joined = with_doy
        .left_join(climatology, col(DAY_OF_YEAR), col(DAY_OF_YEAR))
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .with_column((tavg - col(CLIMATOLOGY)).alias(ANOMALY_COLUMN))
        .collect()?
        .drop_many([ROW_INDEX, DAY_OF_YEAR, CLIMATOLOGY]);

    info!(
        "Computed '{}' against baseline {}-{}",
        ANOMALY_COLUMN, start, end
    );
    Ok(DailyFrame::new(joined))
}

/// Adds `temp_range = tmax - tmin`, null where either is missing and
/// entirely null when either column is absent.
pub fn temp_range(frame: &DailyFrame) -> Result<DailyFrame, ClimateError> {
    if !(frame.has(Variable::TempMax) && frame.has(Variable::TempMin)) {
        warn!("Column 'tmax' or 'tmin' missing, temperature range is all null");
        let mut df = frame.frame.clone();
        df.with_column(Series::full_null(
            TEMP_RANGE_COLUMN.into(),
            df.height(),
            &DataType::Float64,
        ))?;
        return Ok(DailyFrame::new(df));
    }
    let as_float = |variable: Variable| {
        col(variable.column_name())
            .cast(DataType::Float64)
            .fill_nan(lit(NULL))
    };
    DailyFrame::from_lazy(frame.frame.clone().lazy().with_column(
        (as_float(Variable::TempMax) - as_float(Variable::TempMin)).alias(TEMP_RANGE_COLUMN),
    ))
}

/// Rescales to `[0, 1]`; a column with no spread maps to 0.
fn min_max(expr: Expr) -> Expr {
    let min = expr.clone().min();
    let max = expr.clone().max();
    when(max.clone().eq(min.clone()))
        .then(lit(0.0))
        .otherwise((expr - min.clone()) / (max - min))
}

/// A variable as a float expression with nulls and NaNs filled with 0, or the
/// constant 0 when the column is absent.
fn filled_or_zero(frame: &DailyFrame, variable: Variable) -> Expr {
    if frame.has(variable) {
        col(variable.column_name())
            .cast(DataType::Float64)
            .fill_nan(lit(0.0))
            .fill_null(lit(0.0))
    } else {
        warn!("Column '{}' missing, treated as zero", variable);
        lit(0.0)
    }
}

/// Adds `storm_index = w_gust * minmax(wpgt) + w_precip * minmax(prcp)`.
///
/// Missing values count as 0 and a missing column as all zeros. With
/// non-negative weights summing to 1 the index lies in `[0, 1]`.
///
/// # Errors
///
/// Returns [`ClimateError::InvalidWeights`] if a weight is negative or not
/// finite.
pub fn storm_index(
    frame: &DailyFrame,
    w_gust: f64,
    w_precip: f64,
) -> Result<DailyFrame, ClimateError> {
    if !(w_gust.is_finite() && w_precip.is_finite() && w_gust >= 0.0 && w_precip >= 0.0) {
        return Err(ClimateError::InvalidWeights(w_gust, w_precip));
    }
    let gust = filled_or_zero(frame, Variable::PeakGust);
    let precip = filled_or_zero(frame, Variable::Precipitation);
    let index = lit(w_gust) * min_max(gust) + lit(w_precip) * min_max(precip);
    DailyFrame::from_lazy(
        frame
            .frame
            .clone()
            .lazy()
            .with_column(index.alias(STORM_INDEX_COLUMN)),
    )
}
