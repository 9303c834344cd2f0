//! Percentile-threshold selection of the cold and heat tails.

use crate::extremes::{Tail, TailSample, TailSamples};
use crate::math::percentile::{percentile_sorted, sorted_finite};
use crate::types::daily_frame::DailyFrame;
use crate::ClimateError;
use log::warn;

pub(crate) fn check_percentile(q: f64) -> Result<(), ClimateError> {
    if (0.0..=100.0).contains(&q) {
        Ok(())
    } else {
        Err(ClimateError::InvalidPercentile(q))
    }
}

/// Values of `values` in `tail` beyond its `q`-th percentile.
///
/// Missing values (NaN or infinite) are excluded before the percentile is
/// computed and never selected. An empty input yields an empty sample.
pub fn select_tail(values: &[f64], tail: Tail, q: f64) -> Result<TailSample, ClimateError> {
    check_percentile(q)?;
    let sorted = sorted_finite(values);
    let Some(threshold) = percentile_sorted(&sorted, q) else {
        return Ok(TailSample::empty(tail));
    };
    Ok(TailSample {
        tail,
        threshold: Some(threshold),
        values: values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && tail.includes(*v, threshold))
            .collect(),
    })
}

/// Selects the cold tail (`tmin` at or below its `p_low`-th percentile) and
/// the heat tail (`tmax` at or above its `p_high`-th percentile).
///
/// A variable missing from the frame gives an empty sample for its tail.
///
/// # Errors
///
/// Returns [`ClimateError::InvalidPercentile`] if either cutoff is outside
/// `[0, 100]`, or [`ClimateError::ColumnType`] if a column is not numeric.
///
/// # Example
///
/// ```
/// use climatrend::{select_extremes, DailyFrame};
/// use polars::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tmin: Vec<f64> = (0..100).map(f64::from).collect();
/// let frame = DailyFrame::new(df!("tmin" => tmin)?);
///
/// let samples = select_extremes(&frame, 5.0, 95.0)?;
/// assert_eq!(samples.cold.values, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
/// assert!(samples.heat.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn select_extremes(
    frame: &DailyFrame,
    p_low: f64,
    p_high: f64,
) -> Result<TailSamples, ClimateError> {
    check_percentile(p_low)?;
    check_percentile(p_high)?;
    Ok(TailSamples {
        cold: select_from_frame(frame, Tail::Cold, p_low)?,
        heat: select_from_frame(frame, Tail::Heat, p_high)?,
    })
}

fn select_from_frame(frame: &DailyFrame, tail: Tail, q: f64) -> Result<TailSample, ClimateError> {
    match frame.values(tail.variable())? {
        Some(values) => select_tail(&values, tail, q),
        None => {
            warn!(
                "Column '{}' missing, {} tail sample is empty",
                tail.variable(),
                tail
            );
            Ok(TailSample::empty(tail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn fixture() -> Result<DailyFrame, ClimateError> {
        // 1..=40 and its mirror, with gaps.
        let tmin: Vec<Option<f64>> = (1..=40)
            .map(|i| if i % 10 == 0 { None } else { Some(f64::from(i)) })
            .collect();
        let tmax: Vec<Option<f64>> = (1..=40).map(|i| Some(f64::from(41 - i))).collect();
        Ok(DailyFrame::new(df!("tmin" => tmin, "tmax" => tmax)?))
    }

    #[test]
    fn selects_interpolated_tails() -> Result<(), ClimateError> {
        let samples = select_extremes(&fixture()?, 5.0, 95.0)?;
        // tmin: 36 values, p5 at virtual index 1.75 -> 2.75
        assert_eq!(samples.cold.values, vec![1.0, 2.0]);
        assert!((samples.cold.threshold.unwrap() - 2.75).abs() < 1e-12);
        // tmax: 1..=40, p95 at virtual index 37.05 -> 38.05
        assert_eq!(samples.heat.values, vec![40.0, 39.0]);
        assert!((samples.heat.threshold.unwrap() - 38.05).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn approximately_five_percent_each() -> Result<(), ClimateError> {
        let values: Vec<f64> = (0..1000).map(|i| f64::from((i * 389) % 1000)).collect();
        let frame = DailyFrame::new(df!("tmin" => values.clone(), "tmax" => values)?);
        let samples = select_extremes(&frame, 5.0, 95.0)?;
        assert_eq!(samples.cold.len(), 50);
        assert_eq!(samples.heat.len(), 50);
        Ok(())
    }

    #[test]
    fn infinities_are_never_selected() -> Result<(), ClimateError> {
        let values = [1.0, 2.0, f64::INFINITY, 3.0, 4.0, f64::NEG_INFINITY, 5.0];
        let heat = select_tail(&values, Tail::Heat, 75.0)?;
        assert_eq!(heat.threshold, Some(4.0));
        assert_eq!(heat.values, vec![4.0, 5.0]);
        let cold = select_tail(&values, Tail::Cold, 25.0)?;
        assert_eq!(cold.values, vec![1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn missing_variable_gives_empty_sample() -> Result<(), ClimateError> {
        let frame = DailyFrame::new(df!("tmax" => [1.0, 2.0, 3.0])?);
        let samples = select_extremes(&frame, 5.0, 95.0)?;
        assert!(samples.cold.is_empty());
        assert_eq!(samples.cold.threshold, None);
        assert_eq!(samples.heat.values, vec![3.0]);
        Ok(())
    }

    #[test]
    fn all_missing_gives_empty_sample() -> Result<(), ClimateError> {
        let sample = select_tail(&[f64::NAN, f64::NAN], Tail::Heat, 90.0)?;
        assert!(sample.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_out_of_range_percentile() -> Result<(), ClimateError> {
        let frame = fixture()?;
        assert!(matches!(
            select_extremes(&frame, -1.0, 95.0),
            Err(ClimateError::InvalidPercentile(q)) if q == -1.0
        ));
        assert!(select_extremes(&frame, 5.0, 101.0).is_err());
        Ok(())
    }
}
