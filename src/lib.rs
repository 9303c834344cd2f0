mod analyzer;
mod config;
mod error;
mod extremes;
mod math;
mod metrics;
mod summary;
mod trend;
mod types;

pub use analyzer::*;
pub use config::*;
pub use error::ClimateError;

pub use trend::{
    trend_test, trend_test_series, Trend, TrendOptions, TrendResult, MIN_SIGNIFICANCE_VALUES,
    MIN_TREND_VALUES,
};

pub use extremes::gev::*;
pub use extremes::select::{select_extremes, select_tail};
pub use extremes::sensitivity::*;
pub use extremes::tail_fit::*;
pub use extremes::{Tail, TailSample, TailSamples};

pub use math::percentile::percentile;
pub use metrics::*;
pub use summary::*;

pub use types::daily_frame::*;
pub use types::time_series::*;
pub use types::variable::*;
