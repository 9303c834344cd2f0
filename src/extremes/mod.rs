//! Extreme-value analysis of the daily temperature tails.

pub mod gev;
pub mod select;
pub mod sensitivity;
pub mod tail_fit;

use crate::types::variable::Variable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which end of the temperature distribution a sample comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tail {
    /// Low minimum temperatures.
    Cold,
    /// High maximum temperatures.
    Heat,
}

impl Tail {
    /// The variable a tail is drawn from.
    pub fn variable(&self) -> Variable {
        match self {
            Tail::Cold => Variable::TempMin,
            Tail::Heat => Variable::TempMax,
        }
    }

    /// Whether `value` lies in this tail beyond `threshold` (inclusive).
    pub fn includes(&self, value: f64, threshold: f64) -> bool {
        match self {
            Tail::Cold => value <= threshold,
            Tail::Heat => value >= threshold,
        }
    }
}

impl fmt::Display for Tail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tail::Cold => write!(f, "cold"),
            Tail::Heat => write!(f, "heat"),
        }
    }
}

/// Observations beyond a percentile threshold, in original units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailSample {
    pub tail: Tail,
    /// The percentile threshold used, `None` when the variable was absent.
    pub threshold: Option<f64>,
    pub values: Vec<f64>,
}

impl TailSample {
    pub fn empty(tail: Tail) -> Self {
        Self {
            tail,
            threshold: None,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest and largest value, or `None` for an empty sample.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// The cold and heat samples of one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailSamples {
    pub cold: TailSample,
    pub heat: TailSample,
}

impl TailSamples {
    pub fn get(&self, tail: Tail) -> &TailSample {
        match tail {
            Tail::Cold => &self.cold,
            Tail::Heat => &self.heat,
        }
    }
}
