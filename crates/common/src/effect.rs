//! Parameter definitions and values for tunable programs.

use serde::{Deserialize, Serialize};

/// Parameter definition for a program uniform.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub display_name: String,
    pub param_type: ParamType,
    pub default: ParamValue,
}

/// Parameter type with constraints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ParamType {
    /// Float uniform accepted within `[min, max]`.
    Float { min: f32, max: f32 },
}

/// Concrete parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f32),
}

impl ParamValue {
    pub fn as_float(&self) -> f32 {
        match self {
            Self::Float(v) => *v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_value_accessor() {
        assert_eq!(ParamValue::Float(0.5).as_float(), 0.5);
    }

    #[test]
    fn param_def_serializes_with_range() {
        let def = ParamDef {
            name: "damp".into(),
            display_name: "Damping".into(),
            param_type: ParamType::Float { min: 0.0, max: 1.0 },
            default: ParamValue::Float(0.96),
        };
        let json = serde_json::to_string(&def).unwrap();
        assert!(json.contains(r#""Float":{"min":0.0,"max":1.0}"#));
    }
}
