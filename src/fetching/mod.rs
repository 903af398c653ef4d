pub mod error;
pub mod open_meteo;
pub mod source;
pub mod window_fetcher;
