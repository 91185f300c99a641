//! Typed argument schemas for tools.
//!
//! A tool declares its arguments as a list of [`ArgSpec`]s. The same
//! declaration renders the JSON Schema sent to the completion endpoint and
//! validates the arguments the model sends back, so the two cannot drift.

use serde_json::{json, Map, Value};

/// The JSON type an argument must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A JSON string
    String,
    /// A JSON integer (no fractional part)
    Integer,
    /// A JSON boolean
    Boolean,
    /// A JSON string restricted to a fixed set of values
    Enum(&'static [&'static str]),
}

impl ArgKind {
    /// The JSON Schema `type` keyword for this kind.
    #[must_use]
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String | Self::Enum(_) => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Enum(allowed) => value.as_str().is_some_and(|s| allowed.contains(&s)),
        }
    }
}

/// Declaration of one named argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    /// Argument key
    pub name: &'static str,
    /// Expected JSON type
    pub kind: ArgKind,
    /// Whether the key must be present
    pub required: bool,
    /// Human-readable description shown to the model
    pub description: &'static str,
}

/// The full argument schema of a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSchema {
    args: Vec<ArgSpec>,
}

impl ArgumentSchema {
    /// Creates an empty schema (a tool without arguments).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required argument.
    #[must_use]
    pub fn required(mut self, name: &'static str, kind: ArgKind, description: &'static str) -> Self {
        self.args.push(ArgSpec {
            name,
            kind,
            required: true,
            description,
        });
        self
    }

    /// Adds an optional argument.
    #[must_use]
    pub fn optional(mut self, name: &'static str, kind: ArgKind, description: &'static str) -> Self {
        self.args.push(ArgSpec {
            name,
            kind,
            required: false,
            description,
        });
        self
    }

    /// Returns the declared arguments in declaration order.
    #[must_use]
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Renders the schema as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for arg in &self.args {
            let mut property = json!({
                "type": arg.kind.json_type(),
                "description": arg.description,
            });
            if let ArgKind::Enum(allowed) = arg.kind {
                property["enum"] = json!(allowed);
            }
            properties.insert(arg.name.to_string(), property);
        }

        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|arg| arg.required)
            .map(|arg| arg.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Checks `args` against the schema.
    ///
    /// Rejects a non-object value, a missing required key, an undeclared key,
    /// and a value of the wrong JSON type. A `null` for an optional key counts
    /// as absent. The error string names the offending key.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason on the first violation found.
    pub fn validate(&self, args: &Value) -> Result<(), String> {
        let object = args
            .as_object()
            .ok_or_else(|| format!("arguments must be a JSON object, got {}", type_name(args)))?;

        for arg in &self.args {
            match object.get(arg.name) {
                None | Some(Value::Null) if arg.required => {
                    return Err(format!("missing required key '{}'", arg.name));
                }
                None | Some(Value::Null) => {}
                Some(value) if !arg.kind.accepts(value) => {
                    return Err(match arg.kind {
                        ArgKind::Enum(allowed) => format!(
                            "key '{}' must be one of {}, got {value}",
                            arg.name,
                            allowed.join(", ")
                        ),
                        kind => format!(
                            "key '{}' must be of type {}, got {}",
                            arg.name,
                            kind.json_type(),
                            type_name(value)
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        if let Some(unknown) = object
            .keys()
            .find(|key| !self.args.iter().any(|arg| arg.name == key.as_str()))
        {
            return Err(format!("unexpected key '{unknown}'"));
        }

        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
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
