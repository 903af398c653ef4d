//! Piecewise-linear translation of particulate concentrations into an
//! air-quality index.

use std::fmt;

/// One concentration band: `(concentration_low, concentration_high, index_low, index_high)`.
pub type Breakpoint = (f64, f64, f64, f64);

/// PM2.5 bands in µg/m³ (24-hour mean).
pub const PM25_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
    (150.5, 250.4, 201.0, 300.0),
    (250.5, 350.4, 301.0, 400.0),
    (350.5, 500.4, 401.0, 500.0),
];

/// PM10 bands in µg/m³ (24-hour mean).
pub const PM10_BREAKPOINTS: &[Breakpoint] = &[
    (0.0, 54.0, 0.0, 50.0),
    (55.0, 154.0, 51.0, 100.0),
    (155.0, 254.0, 101.0, 150.0),
    (255.0, 354.0, 151.0, 200.0),
    (355.0, 424.0, 201.0, 300.0),
    (425.0, 504.0, 301.0, 400.0),
    (505.0, 604.0, 401.0, 500.0),
];

/// Maps `concentration` onto the index scale of `table`.
///
/// The first band containing the concentration (both ends inclusive) is
/// interpolated linearly. Returns `None` when the concentration is not finite
/// or lies outside every band; it is never clamped.
///
/// # Examples
///
/// ```
/// use aq_pipeline::{to_aqi, PM25_BREAKPOINTS};
///
/// assert_eq!(to_aqi(35.4, PM25_BREAKPOINTS), Some(100.0));
/// assert_eq!(to_aqi(-1.0, PM25_BREAKPOINTS), None);
/// ```
pub fn to_aqi(concentration: f64, table: &[Breakpoint]) -> Option<f64> {
    if !concentration.is_finite() {
        return None;
    }
    table
        .iter()
        .find(|(low, high, _, _)| (*low..=*high).contains(&concentration))
        .map(|&(c_low, c_high, i_low, i_high)| {
            if c_high == c_low {
                return i_high;
            }
            // Band edges map exactly onto their index edges.
            i_low + (i_high - i_low) * ((concentration - c_low) / (c_high - c_low))
        })
}

/// The worse of the PM2.5 and PM10 indices for the same day.
pub fn combined_pm_aqi(pm25: Option<f64>, pm10: Option<f64>) -> Option<f64> {
    let pm25 = pm25.and_then(|c| to_aqi(c, PM25_BREAKPOINTS));
    let pm10 = pm10.and_then(|c| to_aqi(c, PM10_BREAKPOINTS));
    match (pm25, pm10) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn from_index(index: f64) -> Self {
        match index {
            i if i <= 50.0 => AqiCategory::Good,
            i if i <= 100.0 => AqiCategory::Moderate,
            i if i <= 150.0 => AqiCategory::UnhealthyForSensitive,
            i if i <= 200.0 => AqiCategory::Unhealthy,
            i if i <= 300.0 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitive => "Unhealthy for Sensitive",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    /// Label for an optional index, `"N/A"` when there is none.
    pub fn describe(index: Option<f64>) -> &'static str {
        index.map_or("N/A", |i| Self::from_index(i).label())
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
