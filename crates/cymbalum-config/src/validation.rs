//! Parameter name and value validation.
//!
//! Config files name parameters by string id and give real (plain) values.
//! [`validate_param`] resolves the name and checks the value against the
//! parameter's descriptor before anything touches a [`ParameterStore`].
//!
//! # Example
//!
//! ```rust
//! use cymbalum_config::validate_param;
//! use cymbalum_synth::Param;
//!
//! let (id, value) = validate_param("Decay", 3.5).unwrap();
//! assert_eq!(id, Param::Decay.id());
//! assert_eq!(value, 3.5);
//!
//! assert!(validate_param("units", 2.5).is_err());
//! assert!(validate_param("drive", 0.5).is_err());
//! ```
//!
//! [`ParameterStore`]: cymbalum_synth::ParameterStore

use cymbalum_synth::{ParamId, ParameterStore};

use crate::error::ConfigError;

/// Tolerance for stepped values given as floats.
const STEP_TOLERANCE: f64 = 1e-6;

/// Normalize a parameter name for lookup.
///
/// Lowercases and maps `-` and spaces to `_`, so `"Min Frequency"` and
/// `"min-frequency"` both find `min_frequency`.
pub fn normalize_param_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Resolve a parameter name to its id.
///
/// # Errors
///
/// [`ConfigError::UnknownParameter`] if no parameter has that string id.
pub fn find_param(name: &str) -> Result<ParamId, ConfigError> {
    ParameterStore::find(&normalize_param_name(name))
        .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))
}

/// Resolve a name and check a plain value against its descriptor.
///
/// Returns the id and the value as the engine stores it.
///
/// # Errors
///
/// [`ConfigError::UnknownParameter`] for an unknown name.
/// [`ConfigError::InvalidParameter`] for a non-finite value, a value outside
/// the range, or a fractional value for a stepped parameter.
pub fn validate_param(name: &str, value: f64) -> Result<(ParamId, f32), ConfigError> {
    let id = find_param(name)?;
    let desc = ParameterStore::descriptor(id)
        .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))?;
    let param = desc.string_id;

    if !value.is_finite() {
        return Err(ConfigError::invalid_parameter(param, "value is not finite"));
    }

    let (min, max) = (f64::from(desc.min), f64::from(desc.max));
    if value < min || value > max {
        return Err(ConfigError::invalid_parameter(
            param,
            format!("value {value} out of range [{min}, {max}]"),
        ));
    }

    if desc.is_stepped() && (value - value.round()).abs() > STEP_TOLERANCE {
        return Err(ConfigError::invalid_parameter(
            param,
            format!("value {value} must be a whole number"),
        ));
    }

    Ok((id, value as f32))
}
