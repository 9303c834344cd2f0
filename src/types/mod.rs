pub mod daily_frame;
pub mod time_series;
pub mod variable;
