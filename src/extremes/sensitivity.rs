//! How the size of each tail responds to the choice of percentile cutoff.

use crate::extremes::select::check_percentile;
use crate::extremes::Tail;
use crate::math::percentile::{percentile_sorted, sorted_finite};
use crate::types::daily_frame::DailyFrame;
use crate::ClimateError;
use log::warn;
use ordered_float::OrderedFloat;
use polars::prelude::{Column, DataFrame, NamedFrom};
use serde::{Deserialize, Serialize};

/// Cold-tail cutoffs scanned by default.
pub const DEFAULT_LOW_CUTOFFS: [f64; 4] = [1.0, 2.0, 5.0, 10.0];
/// Heat-tail cutoffs scanned by default.
pub const DEFAULT_HIGH_CUTOFFS: [f64; 4] = [90.0, 95.0, 98.0, 99.0];

/// Size of one tail at one percentile cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub category: Tail,
    pub percentile: f64,
    pub threshold: f64,
    pub count: usize,
}

/// Scans the cold tail of `tmin` over `low_cutoffs` and the heat tail of
/// `tmax` over `high_cutoffs`.
///
/// Rows are sorted by category (cold first), then percentile. A variable
/// that is absent or entirely missing contributes no rows.
///
/// # Errors
///
/// Returns [`ClimateError::InvalidPercentile`] if any cutoff is outside
/// `[0, 100]`.
pub fn sensitivity(
    frame: &DailyFrame,
    low_cutoffs: &[f64],
    high_cutoffs: &[f64],
) -> Result<Vec<SensitivityRow>, ClimateError> {
    for q in low_cutoffs.iter().chain(high_cutoffs) {
        check_percentile(*q)?;
    }

    let mut rows = Vec::with_capacity(low_cutoffs.len() + high_cutoffs.len());
    for (tail, cutoffs) in [(Tail::Cold, low_cutoffs), (Tail::Heat, high_cutoffs)] {
        let Some(values) = frame.values(tail.variable())? else {
            warn!(
                "Column '{}' missing, no {} sensitivity rows",
                tail.variable(),
                tail
            );
            continue;
        };
        rows.extend(scan(&values, tail, cutoffs));
    }
    rows.sort_by_key(|row| (row.category, OrderedFloat(row.percentile)));
    Ok(rows)
}

fn scan(values: &[f64], tail: Tail, cutoffs: &[f64]) -> Vec<SensitivityRow> {
    let sorted = sorted_finite(values);
    cutoffs
        .iter()
        .filter_map(|q| {
            let threshold = percentile_sorted(&sorted, *q)?;
            Some(SensitivityRow {
                category: tail,
                percentile: *q,
                threshold,
                count: sorted.iter().filter(|v| tail.includes(**v, threshold)).count(),
            })
        })
        .collect()
}

/// Lays rows out as a table with columns `category`, `percentile`,
/// `threshold` and `count`.
pub fn sensitivity_frame(rows: &[SensitivityRow]) -> Result<DataFrame, ClimateError> {
    let categories: Vec<String> = rows.iter().map(|r| r.category.to_string()).collect();
    let percentiles: Vec<f64> = rows.iter().map(|r| r.percentile).collect();
    let thresholds: Vec<f64> = rows.iter().map(|r| r.threshold).collect();
    let counts: Vec<u64> = rows.iter().map(|r| r.count as u64).collect();
    Ok(DataFrame::new(vec![
        Column::new("category".into(), categories),
        Column::new("percentile".into(), percentiles),
        Column::new("threshold".into(), thresholds),
        Column::new("count".into(), counts),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn frame() -> Result<DailyFrame, ClimateError> {
        let tmin: Vec<f64> = (0..100).map(f64::from).collect();
        let tmax: Vec<f64> = (0..100).map(|v| f64::from(v) + 0.5).collect();
        Ok(DailyFrame::new(df!("tmin" => tmin, "tmax" => tmax)?))
    }

    #[test]
    fn default_grid_counts() -> Result<(), ClimateError> {
        let rows = sensitivity(&frame()?, &DEFAULT_LOW_CUTOFFS, &DEFAULT_HIGH_CUTOFFS)?;
        assert_eq!(rows.len(), 8);
        let counts: Vec<usize> = rows.iter().map(|r| r.count).collect();
        // tmin p1 = 0.99 -> {0}; p2 = 1.98 -> {0, 1}; p5 = 4.95; p10 = 9.9
        // tmax p90 = 89.6 -> 10 values, p95 = 94.55, p98 = 97.52, p99 = 98.51
        assert_eq!(counts, vec![1, 2, 5, 10, 10, 5, 2, 1]);
        assert!(rows[..4].iter().all(|r| r.category == Tail::Cold));
        Ok(())
    }

    #[test]
    fn rows_are_sorted() -> Result<(), ClimateError> {
        let rows = sensitivity(&frame()?, &[10.0, 1.0], &[99.0, 90.0])?;
        let keys: Vec<(Tail, f64)> = rows.iter().map(|r| (r.category, r.percentile)).collect();
        assert_eq!(
            keys,
            vec![
                (Tail::Cold, 1.0),
                (Tail::Cold, 10.0),
                (Tail::Heat, 90.0),
                (Tail::Heat, 99.0)
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_variable_contributes_no_rows() -> Result<(), ClimateError> {
        let frame = DailyFrame::new(df!("tmax" => [1.0, 2.0, 3.0])?);
        let rows = sensitivity(&frame, &DEFAULT_LOW_CUTOFFS, &[50.0])?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, Tail::Heat);
        assert_eq!(rows[0].count, 2);

        let empty = DailyFrame::new(df!("tmin" => [f64::NAN, f64::NAN])?);
        assert!(sensitivity(&empty, &[5.0], &[95.0])?.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_invalid_cutoff() -> Result<(), ClimateError> {
        assert!(matches!(
            sensitivity(&frame()?, &[5.0], &[120.0]),
            Err(ClimateError::InvalidPercentile(_))
        ));
        Ok(())
    }

    #[test]
    fn rows_to_frame() -> Result<(), ClimateError> {
        let rows = sensitivity(&frame()?, &[5.0], &[95.0])?;
        let table = sensitivity_frame(&rows)?;
        assert_eq!(table.shape(), (2, 4));
        assert_eq!(
            table.get_column_names_str(),
            vec!["category", "percentile", "threshold", "count"]
        );
        Ok(())
    }
}
