//! Tool Input Schemas
//!
//! A small tagged description of the arguments a tool accepts, plus the
//! validator that checks what the reasoning engine proposed against it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Validated tool arguments
pub type ToolArgs = Map<String, Value>;

/// JSON type of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Why a set of arguments was rejected
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaViolation {
    #[error("arguments must be a JSON object, got {found}")]
    NotAnObject { found: String },

    #[error("missing required parameter `{name}`")]
    MissingParameter { name: String },

    #[error("parameter `{name}` must be {expected}, got {found}")]
    WrongType {
        name: String,
        expected: ParamType,
        found: String,
    },

    #[error("parameter `{name}` must be one of {allowed}, got {value}")]
    NotAllowed {
        name: String,
        allowed: String,
        value: String,
    },
}

/// Parameter definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON type
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        if !self.param_type.accepts(value) {
            return Err(SchemaViolation::WrongType {
                name: self.name.clone(),
                expected: self.param_type,
                found: json_type_name(value).into(),
            });
        }

        if let Some(allowed) = &self.enum_values {
            if !allowed.contains(value) {
                return Err(SchemaViolation::NotAllowed {
                    name: self.name.clone(),
                    allowed: Value::Array(allowed.clone()).to_string(),
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Structural description of a tool's arguments: a flat object whose
/// parameters are listed in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    pub parameters: Vec<ParameterSchema>,
}

impl InputSchema {
    /// Schema for a tool that takes no arguments
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(parameters: Vec<ParameterSchema>) -> Self {
        Self { parameters }
    }

    #[must_use]
    pub fn param(mut self, parameter: ParameterSchema) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Validate proposed arguments.
    ///
    /// `null` is treated as an empty object. Defaults are filled in for
    /// absent optional parameters and undeclared keys are dropped, so the
    /// returned map holds exactly the declared parameters that have a value.
    pub fn validate(&self, value: &Value) -> Result<ToolArgs, SchemaViolation> {
        let empty = Map::new();
        let supplied = match value {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(SchemaViolation::NotAnObject {
                    found: json_type_name(other).into(),
                });
            }
        };

        let mut args = ToolArgs::new();
        for param in &self.parameters {
            match supplied.get(&param.name).filter(|v| !v.is_null()) {
                Some(v) => {
                    param.check(v)?;
                    args.insert(param.name.clone(), v.clone());
                }
                None => {
                    if let Some(default) = &param.default {
                        args.insert(param.name.clone(), default.clone());
                    } else if param.required {
                        return Err(SchemaViolation::MissingParameter {
                            name: param.name.clone(),
                        });
                    }
                }
            }
        }

        Ok(args)
    }

    /// Render as a JSON Schema object (for providers with native function
    /// calling and for the prompt catalog)
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(param.param_type.as_str()));
            prop.insert("description".into(), json!(param.description));
            if let Some(default) = &param.default {
                prop.insert("default".into(), default.clone());
            }
            if let Some(values) = &param.enum_values {
                prop.insert("enum".into(), Value::Array(values.clone()));
            }
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
