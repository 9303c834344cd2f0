//! Defines the daily weather variables the analyses operate on and their
//! column names in a daily frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A measured daily weather variable.
///
/// Column names follow the Meteostat daily schema, so frames produced by a
/// Meteostat client can be analysed without renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    /// Average air temperature (°C), column `tavg`.
    #[serde(rename = "tavg")]
    TempAvg,
    /// Minimum air temperature (°C), column `tmin`.
    #[serde(rename = "tmin")]
    TempMin,
    /// Maximum air temperature (°C), column `tmax`.
    #[serde(rename = "tmax")]
    TempMax,
    /// Daily precipitation total (mm), column `prcp`.
    #[serde(rename = "prcp")]
    Precipitation,
    /// Snow depth (mm), column `snow`.
    #[serde(rename = "snow")]
    Snow,
    /// Average wind speed (km/h), column `wspd`.
    #[serde(rename = "wspd")]
    WindSpeed,
    /// Peak wind gust (km/h), column `wpgt`.
    #[serde(rename = "wpgt")]
    PeakGust,
}

impl Variable {
    pub const ALL: [Variable; 7] = [
        Variable::TempAvg,
        Variable::TempMin,
        Variable::TempMax,
        Variable::Precipitation,
        Variable::Snow,
        Variable::WindSpeed,
        Variable::PeakGust,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            Variable::TempAvg => "tavg",
            Variable::TempMin => "tmin",
            Variable::TempMax => "tmax",
            Variable::Precipitation => "prcp",
            Variable::Snow => "snow",
            Variable::WindSpeed => "wspd",
            Variable::PeakGust => "wpgt",
        }
    }

    /// Looks a variable up by its column name.
    pub fn from_column_name(name: &str) -> Option<Variable> {
        Variable::ALL.into_iter().find(|v| v.column_name() == name)
    }
}

/// Formats a `Variable` as its column name.
///
/// # Examples
///
/// ```
/// use climatrend::Variable;
///
/// assert_eq!(Variable::TempMax.to_string(), "tmax");
/// assert_eq!(format!("{}", Variable::PeakGust), "wpgt");
/// ```
impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_round_trip() {
        for variable in Variable::ALL {
            assert_eq!(Variable::from_column_name(variable.column_name()), Some(variable));
        }
        assert_eq!(Variable::from_column_name("coco"), None);
    }

    #[test]
    fn serializes_as_column_name() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&Variable::TempMin)?, "\"tmin\"");
        let parsed: Variable = serde_json::from_str("\"prcp\"")?;
        assert_eq!(parsed, Variable::Precipitation);
        Ok(())
    }
}
