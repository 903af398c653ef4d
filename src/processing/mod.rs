pub mod aqi;
pub mod metrics;
pub mod reduce;
pub mod report;
pub mod windows;
