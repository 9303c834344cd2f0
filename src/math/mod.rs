pub mod optimize;
pub mod percentile;
pub mod special;
