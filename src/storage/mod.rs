pub mod artifacts;
pub mod csv_store;
pub mod error;
