//! Contains the `DailyFrame` structure wrapping a cleaned daily weather table.

use crate::types::time_series::TimeSeries;
use crate::types::variable::Variable;
use crate::ClimateError;
use chrono::NaiveDate;
use log::info;
use polars::prelude::{
    col, lit, CsvParseOptions, CsvReadOptions, DataFrame, DataType, Expr, IntoLazy, LazyFrame,
    SerReader, Series,
};
use std::path::Path;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01, polars' `Date` epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// A wrapper around a Polars `DataFrame` holding one station's daily record.
///
/// The frame is expected to follow the Meteostat daily schema: a `date`
/// column of type `Date` plus any subset of the numeric columns named by
/// [`Variable`]. Columns that are absent are treated as missing variables,
/// never as an error, so a partial dataset still produces partial output.
///
/// # Example
///
/// ```
/// use climatrend::{DailyFrame, Variable};
/// use polars::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let frame = DailyFrame::new(df!(
///     "tmax" => [21.0, 23.5, f64::NAN, 19.0],
/// )?);
///
/// assert_eq!(frame.values(Variable::TempMax)?, Some(vec![21.0, 23.5, 19.0]));
/// assert_eq!(frame.values(Variable::TempMin)?, None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DailyFrame {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
}

impl DailyFrame {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Collects a `LazyFrame` into a `DailyFrame`.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::Polars`] if the lazy query fails to execute.
    pub fn from_lazy(frame: LazyFrame) -> Result<Self, ClimateError> {
        Ok(Self::new(frame.collect()?))
    }

    /// Reads a cleaned daily table from a CSV file with a header row.
    ///
    /// Columns must already carry the daily schema names; ISO dates in the
    /// `date` column are parsed to `Date`.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::Polars`] if the file cannot be read or parsed.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, ClimateError> {
        let path = path.as_ref();
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        info!(
            "Read {} daily rows from {}",
            frame.height(),
            path.display()
        );
        Ok(Self::new(frame))
    }

    /// Number of rows (days).
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether the frame carries a column for `variable`.
    pub fn has(&self, variable: Variable) -> bool {
        self.has_column(variable.column_name())
    }

    fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Filters the rows with a Polars predicate expression, returning a new frame.
    ///
    /// # Arguments
    ///
    /// * `predicate` - A Polars [`Expr`] defining the filtering condition.
    ///
    /// # Example
    ///
    /// ```
    /// use climatrend::DailyFrame;
    /// use polars::prelude::*;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let frame = DailyFrame::new(df!("tavg" => [12.0, 25.0, 31.0])?);
    /// let warm = frame.filter(col("tavg").gt(lit(20.0f64)))?;
    /// assert_eq!(warm.height(), 2);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::Polars`] if the predicate cannot be evaluated
    /// against this frame (for example when it references a missing column).
    pub fn filter(&self, predicate: Expr) -> Result<DailyFrame, ClimateError> {
        Self::from_lazy(self.frame.clone().lazy().filter(predicate))
    }

    /// Restricts the frame to dates within `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::Polars`] if the frame has no `date` column.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> Result<DailyFrame, ClimateError> {
        self.filter(
            col("date")
                .gt_eq(lit(start))
                .and(col("date").lt_eq(lit(end))),
        )
    }

    /// Every row of `variable` as `f64`, with nulls, NaNs and infinities mapped to `None`.
    ///
    /// Returns `Ok(None)` when the column is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::ColumnType`] if the column cannot be cast to a
    /// floating-point type.
    pub fn column_values(&self, variable: Variable) -> Result<Option<Vec<Option<f64>>>, ClimateError> {
        self.float_column(variable.column_name())
    }

    /// The non-missing values of `variable` in row order.
    ///
    /// Returns `Ok(None)` when the column is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::ColumnType`] if the column cannot be cast to a
    /// floating-point type.
    pub fn values(&self, variable: Variable) -> Result<Option<Vec<f64>>, ClimateError> {
        self.named_values(variable.column_name())
    }

    /// The non-missing values of any numeric column, such as a derived one.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::ColumnType`] if the column cannot be cast to a
    /// floating-point type.
    pub fn named_values(&self, name: &str) -> Result<Option<Vec<f64>>, ClimateError> {
        Ok(self
            .float_column(name)?
            .map(|column| column.into_iter().flatten().collect()))
    }

    /// Every row of the `date` column, or `Ok(None)` when the frame has none.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::ColumnType`] if `date` is not a `Date` column.
    pub fn dates(&self) -> Result<Option<Vec<Option<NaiveDate>>>, ClimateError> {
        Ok(self.day_numbers()?.map(|days| {
            days.into_iter()
                .map(|day| {
                    day.and_then(|d| i32::try_from(d).ok())
                        .and_then(NaiveDate::from_num_days_from_ce_opt)
                })
                .collect()
        }))
    }

    /// `variable` as a [`TimeSeries`], or `Ok(None)` when the column is absent.
    ///
    /// The series is indexed by date (days since 0001-01-01) when the frame has
    /// a `date` column and by row position otherwise. Rows without a date are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::ColumnType`] if a column has the wrong type and
    /// [`ClimateError::UnorderedIndex`] if the dates are not sorted.
    pub fn series(&self, variable: Variable) -> Result<Option<TimeSeries>, ClimateError> {
        let Some(values) = self.column_values(variable)? else {
            return Ok(None);
        };
        let series = match self.day_numbers()? {
            Some(days) => TimeSeries::from_pairs(
                days.into_iter()
                    .zip(values)
                    .filter_map(|(day, value)| day.map(|d| (d, value))),
            )?,
            None => TimeSeries::from_pairs(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| (i as i64, value)),
            )?,
        };
        Ok(Some(series))
    }

    fn float_column(&self, name: &str) -> Result<Option<Vec<Option<f64>>>, ClimateError> {
        let Some(series) = self.materialized(name) else {
            return Ok(None);
        };
        let floats = series
            .strict_cast(&DataType::Float64)
            .map_err(|source| ClimateError::ColumnType {
                column: name.to_string(),
                expected: "f64",
                source,
            })?;
        let chunked = floats.f64().map_err(|source| ClimateError::ColumnType {
            column: name.to_string(),
            expected: "f64",
            source,
        })?;
        Ok(Some(
            chunked
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect(),
        ))
    }

    fn day_numbers(&self) -> Result<Option<Vec<Option<i64>>>, ClimateError> {
        let Some(series) = self.materialized("date") else {
            return Ok(None);
        };
        if series.dtype() != &DataType::Date {
            return Err(ClimateError::ColumnType {
                column: "date".to_string(),
                expected: "Date",
                source: polars::prelude::PolarsError::SchemaMismatch(
                    format!("expected Date, got {}", series.dtype()).into(),
                ),
            });
        }
        let days = series.to_physical_repr();
        let chunked = days.i32().map_err(|source| ClimateError::ColumnType {
            column: "date".to_string(),
            expected: "Date",
            source,
        })?;
        Ok(Some(
            chunked
                .into_iter()
                .map(|d| d.map(|d| i64::from(d) + UNIX_EPOCH_DAYS_FROM_CE))
                .collect(),
        ))
    }

    fn materialized(&self, name: &str) -> Option<Series> {
        if !self.has_column(name) {
            return None;
        }
        self.frame
            .column(name)
            .ok()
            .map(|column| column.as_materialized_series().clone())
    }
}

impl From<DataFrame> for DailyFrame {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use polars::df;

    fn dated_frame() -> Result<DailyFrame, ClimateError> {
        let dates: Vec<NaiveDate> = (1..=5)
            .map(|d| NaiveDate::from_ymd_opt(2021, 3, d).unwrap())
            .collect();
        let frame = df!(
            "date" => dates,
            "tmin" => [Some(1.0), None, Some(3.0), Some(f64::NAN), Some(5.0)],
            "prcp" => [0i32, 2, 0, 7, 1],
        )?;
        Ok(DailyFrame::new(frame))
    }

    #[test]
    fn values_skip_nulls_and_nan() -> Result<(), ClimateError> {
        let frame = dated_frame()?;
        assert_eq!(frame.values(Variable::TempMin)?, Some(vec![1.0, 3.0, 5.0]));
        assert_eq!(
            frame.column_values(Variable::TempMin)?,
            Some(vec![Some(1.0), None, Some(3.0), None, Some(5.0)])
        );
        Ok(())
    }

    #[test]
    fn infinities_are_missing() -> Result<(), ClimateError> {
        let frame = DailyFrame::new(df!("tmax" => [f64::INFINITY, 2.0, f64::NEG_INFINITY])?);
        assert_eq!(frame.values(Variable::TempMax)?, Some(vec![2.0]));
        Ok(())
    }

    #[test]
    fn named_values_reads_any_column() -> Result<(), ClimateError> {
        let frame = DailyFrame::new(df!("storm_index" => [Some(0.5), None, Some(1.0)])?);
        assert_eq!(frame.named_values("storm_index")?, Some(vec![0.5, 1.0]));
        assert_eq!(frame.named_values("temp_range")?, None);
        Ok(())
    }

    #[test]
    fn integer_columns_are_cast() -> Result<(), ClimateError> {
        let frame = dated_frame()?;
        assert_eq!(
            frame.values(Variable::Precipitation)?,
            Some(vec![0.0, 2.0, 0.0, 7.0, 1.0])
        );
        Ok(())
    }

    #[test]
    fn missing_variable_is_none() -> Result<(), ClimateError> {
        let frame = dated_frame()?;
        assert!(!frame.has(Variable::PeakGust));
        assert_eq!(frame.values(Variable::PeakGust)?, None);
        assert_eq!(frame.series(Variable::PeakGust)?, None);
        Ok(())
    }

    #[test]
    fn string_column_is_a_type_error() -> Result<(), ClimateError> {
        let frame = DailyFrame::new(df!("tmax" => ["hot", "cold"])?);
        assert!(matches!(
            frame.values(Variable::TempMax),
            Err(ClimateError::ColumnType { .. })
        ));
        Ok(())
    }

    #[test]
    fn series_is_indexed_by_date() -> Result<(), ClimateError> {
        let frame = dated_frame()?;
        let series = frame.series(Variable::TempMin)?.unwrap();
        let first = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        assert_eq!(series.index()[0], i64::from(first.num_days_from_ce()));
        assert_eq!(series.index()[4] - series.index()[0], 4);
        assert_eq!(series.missing_count(), 2);
        Ok(())
    }

    #[test]
    fn series_without_dates_uses_positions() -> Result<(), ClimateError> {
        let frame = DailyFrame::new(df!("tavg" => [3.0, 4.0, 5.0])?);
        let series = frame.series(Variable::TempAvg)?.unwrap();
        assert_eq!(series.index(), &[0, 1, 2]);
        Ok(())
    }

    #[test]
    fn dates_round_trip() -> Result<(), ClimateError> {
        let frame = dated_frame()?;
        let dates = frame.dates()?.unwrap();
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2021, 3, 3));
        Ok(())
    }

    #[test]
    fn get_range_is_inclusive() -> Result<(), ClimateError> {
        let frame = dated_frame()?;
        let start = NaiveDate::from_ymd_opt(2021, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 3, 4).unwrap();
        let ranged = frame.get_range(start, end)?;
        assert_eq!(ranged.height(), 3);
        Ok(())
    }

    #[test]
    fn reads_csv_with_dates() -> Result<(), Box<dyn std::error::Error>> {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "date,tavg,tmin,tmax,prcp")?;
        writeln!(file, "2021-01-01,1.5,-2.0,4.0,0.0")?;
        writeln!(file, "2021-01-02,2.5,,5.0,3.2")?;
        file.flush()?;

        let frame = DailyFrame::read_csv(file.path())?;
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.values(Variable::TempMin)?, Some(vec![-2.0]));
        let dates = frame.dates()?.unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2021, 1, 2));
        Ok(())
    }

    #[test]
    fn filter_by_expression() -> Result<(), ClimateError> {
        let frame = dated_frame()?;
        let wet = frame.filter(col("prcp").gt(lit(0)))?;
        assert_eq!(wet.height(), 3);
        Ok(())
    }
}
