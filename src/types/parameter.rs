//! The catalog of supported pollutants.
//!
//! Users refer to pollutants by short identifiers (`pm25`, `no2`, ...), while the
//! upstream provider and every persisted table use the provider's canonical field
//! names (`pm2_5`, `nitrogen_dioxide`, ...). [`Parameter`] is the single typed
//! representation both sides are mapped onto.

use crate::types::error::ParameterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pollutant supported by the pipeline.
///
/// The declaration order is the catalog order; tables built from
/// [`Parameter::all`] list their columns in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    /// Particulate matter with a diameter below 2.5 µm.
    Pm25,
    /// Particulate matter with a diameter below 10 µm.
    Pm10,
    /// Nitrogen dioxide.
    NitrogenDioxide,
    /// Carbon monoxide.
    CarbonMonoxide,
}

impl Parameter {
    /// Every supported parameter in catalog order.
    pub fn all() -> [Parameter; 4] {
        [
            Parameter::Pm25,
            Parameter::Pm10,
            Parameter::NitrogenDioxide,
            Parameter::CarbonMonoxide,
        ]
    }

    /// The short, user-facing identifier.
    pub fn short_name(&self) -> &'static str {
        match self {
            Parameter::Pm25 => "pm25",
            Parameter::Pm10 => "pm10",
            Parameter::NitrogenDioxide => "no2",
            Parameter::CarbonMonoxide => "co",
        }
    }

    /// The upstream provider's field name, also used as the column header in
    /// persisted tables.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Parameter::Pm25 => "pm2_5",
            Parameter::Pm10 => "pm10",
            Parameter::NitrogenDioxide => "nitrogen_dioxide",
            Parameter::CarbonMonoxide => "carbon_monoxide",
        }
    }

    /// Looks up a parameter by its short identifier (case-insensitive).
    pub fn from_short(name: &str) -> Option<Parameter> {
        let normalized = name.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|p| p.short_name() == normalized)
    }

    /// Looks up a parameter by its canonical field name (case-insensitive).
    pub fn from_canonical(name: &str) -> Option<Parameter> {
        let normalized = name.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|p| p.canonical_name() == normalized)
    }

    /// Accepts either a short identifier or a canonical name.
    pub fn parse(name: &str) -> Option<Parameter> {
        Self::from_short(name).or_else(|| Self::from_canonical(name))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

fn allowed_short_names() -> Vec<String> {
    let mut allowed: Vec<String> = Parameter::all()
        .iter()
        .map(|p| p.short_name().to_string())
        .collect();
    allowed.sort();
    allowed
}

/// Validates user-supplied short identifiers and returns them lower-cased.
///
/// Every unrecognised entry is collected before failing, so the error lists all
/// offenders at once.
///
/// # Errors
///
/// Returns [`ParameterError::Unsupported`] if any entry is not a known short identifier.
///
/// # Examples
///
/// ```
/// use aq_pipeline::validate_parameters;
///
/// assert_eq!(validate_parameters(&["PM25", "no2"]).unwrap(), vec!["pm25", "no2"]);
/// assert!(validate_parameters(&["pm25", "o3", "so2"]).is_err());
/// ```
pub fn validate_parameters<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, ParameterError> {
    let normalized: Vec<String> = names
        .iter()
        .map(|n| n.as_ref().trim().to_lowercase())
        .collect();
    let unsupported: Vec<String> = normalized
        .iter()
        .filter(|n| Parameter::from_short(n).is_none())
        .cloned()
        .collect();
    if !unsupported.is_empty() {
        return Err(ParameterError::Unsupported {
            unsupported,
            allowed: allowed_short_names(),
        });
    }
    Ok(normalized)
}

/// Resolves short identifiers into typed parameters, preserving input order and
/// dropping repeats (first occurrence wins).
///
/// # Errors
///
/// Returns [`ParameterError::Unsupported`] under the same conditions as [`validate_parameters`].
pub fn resolve_parameters<S: AsRef<str>>(names: &[S]) -> Result<Vec<Parameter>, ParameterError> {
    let mut resolved: Vec<Parameter> = Vec::new();
    for name in validate_parameters(names)? {
        // validate_parameters rejected every unknown identifier already
        if let Some(parameter) = Parameter::from_short(&name) {
            if !resolved.contains(&parameter) {
                resolved.push(parameter);
            }
        }
    }
    Ok(resolved)
}

/// Maps short identifiers to the provider's canonical field names.
///
/// Order is preserved and duplicate canonical names are removed, so repeating a
/// short identifier never produces a redundant column.
///
/// # Errors
///
/// Returns [`ParameterError::Unsupported`] under the same conditions as [`validate_parameters`].
///
/// # Examples
///
/// ```
/// use aq_pipeline::to_canonical;
///
/// let fields = to_canonical(&["pm25", "pm10", "pm25"]).unwrap();
/// assert_eq!(fields, vec!["pm2_5", "pm10"]);
/// ```
pub fn to_canonical<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, ParameterError> {
    Ok(resolve_parameters(names)?
        .into_iter()
        .map(|p| p.canonical_name().to_string())
        .collect())
}

/// Resolves a mix of short identifiers and canonical names, as accepted on the
/// command line of the pipeline runner.
///
/// # Errors
///
/// Returns [`ParameterError::Unsupported`] listing every name that is neither a
/// short identifier nor a canonical name.
pub fn parse_parameter_list(list: &str) -> Result<Vec<Parameter>, ParameterError> {
    let mut resolved = Vec::new();
    let mut unsupported = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match Parameter::parse(name) {
            Some(p) if !resolved.contains(&p) => resolved.push(p),
            Some(_) => {}
            None => unsupported.push(name.to_lowercase()),
        }
    }
    if !unsupported.is_empty() {
        return Err(ParameterError::Unsupported {
            unsupported,
            allowed: allowed_short_names(),
        });
    }
    Ok(resolved)
}
