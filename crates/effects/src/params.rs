//! Parameter validation and conversion helpers.

use aft_common::{ParamDef, ParamType, ParamValue};

use crate::error::EffectError;

/// Validate parameter values against their definitions.
///
/// Checks that every supplied parameter has a matching definition and that
/// its value lies within the defined range.
pub fn validate_params(
    defs: &[ParamDef],
    params: &[(String, ParamValue)],
) -> Result<(), EffectError> {
    for (name, value) in params {
        let def =
            defs.iter()
                .find(|d| d.name == *name)
                .ok_or_else(|| EffectError::UnknownParam {
                    param: name.clone(),
                })?;

        validate_single_param(def, value)?;
    }
    Ok(())
}

/// Validate a single parameter value against its definition.
fn validate_single_param(def: &ParamDef, value: &ParamValue) -> Result<(), EffectError> {
    let ParamType::Float { min, max } = def.param_type;
    let v = value.as_float();
    // NaN fails both comparisons, so test containment instead.
    if !(min..=max).contains(&v) {
        return Err(EffectError::ParamOutOfRange {
            param: def.name.clone(),
            value: format!("{v}"),
            min: format!("{min}"),
            max: format!("{max}"),
        });
    }
    Ok(())
}

/// Get a parameter value from the supplied params, falling back to the default.
///
/// Returns `None` only if the parameter name is not found in either `params` or `defs`.
pub fn get_param_or_default<'a>(
    name: &str,
    params: &'a [(String, ParamValue)],
    defs: &'a [ParamDef],
) -> Option<&'a ParamValue> {
    if let Some(val) = params.iter().find(|(n, _)| n == name).map(|(_, v)| v) {
        return Some(val);
    }
    defs.iter().find(|d| d.name == name).map(|d| &d.default)
}

/// Helper to extract a float parameter, with fallback to default.
pub fn get_float(name: &str, params: &[(String, ParamValue)], defs: &[ParamDef]) -> f32 {
    get_param_or_default(name, params, defs)
        .map(ParamValue::as_float)
        .unwrap_or(0.0)
}
