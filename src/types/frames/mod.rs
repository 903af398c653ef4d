pub mod daily_matrix;
pub mod raw_series;
