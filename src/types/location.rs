use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use aq_pipeline::LatLon;
///
/// let milan = LatLon(45.4642, 9.1900);
/// assert_eq!(milan.0, 45.4642); // Latitude
/// assert_eq!(milan.1, 9.1900); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

/// A named point the pipeline is run for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Display name; `None` for ad-hoc coordinates.
    pub name: Option<String>,
    pub location: LatLon,
}

impl Target {
    pub fn new(name: impl Into<String>, location: LatLon) -> Self {
        Self {
            name: Some(name.into()),
            location,
        }
    }

    pub fn from_coordinates(location: LatLon) -> Self {
        Self {
            name: None,
            location,
        }
    }

    /// A filesystem-friendly identifier: the lower-cased name (or `lat_lon`)
    /// with every non-alphanumeric character replaced by `_`.
    pub fn slug(&self) -> String {
        let raw = match &self.name {
            Some(name) => name.clone(),
            None => format!("{}_{}", self.location.0, self.location.1),
        };
        raw.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .trim_matches('_')
            .to_string()
    }

    /// The name, falling back to the slug for ad-hoc coordinates.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.slug())
    }
}

const KNOWN_CITIES: [(&str, f64, f64); 7] = [
    ("berlin", 52.5200, 13.4050),
    ("madrid", 40.4168, -3.7038),
    ("milan", 45.4642, 9.1900),
    ("monza", 45.5845, 9.2744),
    ("paris", 48.8566, 2.3522),
    ("rome", 41.9028, 12.4964),
    ("tehran", 35.6892, 51.3890),
];

/// Looks up one of the built-in cities by key (case-insensitive).
///
/// The returned target is named with the title-cased key, e.g. `"Milan"`.
pub fn known_city(key: &str) -> Option<Target> {
    let key = key.trim().to_lowercase();
    KNOWN_CITIES
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|(name, lat, lon)| Target::new(title_case(name), LatLon(*lat, *lon)))
}

/// Keys of the built-in cities, sorted.
pub fn known_city_keys() -> Vec<&'static str> {
    KNOWN_CITIES.iter().map(|(name, _, _)| *name).collect()
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
