//! Schema model
//!
//! A schema is a flat set of field rules keyed by exact, case-sensitive
//! field name. Rules are kept in a `BTreeMap` so that validation visits
//! them, and therefore reports violations, in a stable order.

use error_common::ValidationErrors;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Declared type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    /// Any scalar; the permitted values come from `allowed`
    Enum,
    /// Any object or array
    Json,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Enum => "enum",
            Self::Json => "json",
        }
    }

    /// Whether `min`/`max` make sense for this type
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Base type check, before any constraint is looked at
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Float, Value::Number(_))
            | (Self::Enum, Value::String(_) | Value::Number(_) | Value::Bool(_))
            | (Self::Json, Value::Object(_) | Value::Array(_)) => true,
            (Self::Int, Value::Number(n)) => {
                n.is_i64()
                    || n.is_u64()
                    || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a value's JSON kind, as shown in type-mismatch messages
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Constraints on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Injected when the field is absent; ignored for required fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Inclusive lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Inclusive upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
}

impl FieldRule {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            description: None,
            default: None,
            min: None,
            max: None,
            allowed: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_allowed(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }
}

/// Developer-defined contract for a configuration payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Informational format version
    #[serde(default)]
    pub version: i64,

    #[serde(default)]
    pub rules: BTreeMap<String, FieldRule>,
}

impl Schema {
    pub fn new(version: i64) -> Self {
        Self {
            version,
            rules: BTreeMap::new(),
        }
    }

    pub fn with_rule(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.rules.insert(field.into(), rule);
        self
    }

    /// Parse a schema from its stored JSON form
    ///
    /// # Errors
    ///
    /// Returns a single-entry [`ValidationErrors`] describing why the
    /// document is not a schema.
    pub fn from_value(value: &Value) -> Result<Self, ValidationErrors> {
        Self::deserialize(value)
            .map_err(|e| ValidationErrors::from_messages([format!("invalid schema: {e}")]))
    }

    /// Problems with the rule definitions themselves, independent of any payload
    pub fn definition_errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        for (field, rule) in &self.rules {
            let has_bounds = rule.min.is_some() || rule.max.is_some();
            if has_bounds && !rule.field_type.is_numeric() {
                errors.push(format!(
                    "schema: field '{field}' declares min/max but type {} is not numeric",
                    rule.field_type
                ));
            }

            if let (Some(min), Some(max)) = (rule.min, rule.max) {
                if min > max {
                    errors.push(format!(
                        "schema: field '{field}' has min {min} greater than max {max}"
                    ));
                }
            }

            if let Some(default) = &rule.default {
                if !rule.field_type.accepts(default) {
                    errors.push(format!(
                        "schema: field '{field}' default does not match type {}",
                        rule.field_type
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_accepts_whole_floats_only() {
        assert!(FieldType::Int.accepts(&json!(4)));
        assert!(FieldType::Int.accepts(&json!(4.0)));
        assert!(!FieldType::Int.accepts(&json!(4.5)));
        assert!(!FieldType::Int.accepts(&json!("4")));
    }

    #[test]
    fn enum_and_json_base_types() {
        assert!(FieldType::Enum.accepts(&json!("a")));
        assert!(FieldType::Enum.accepts(&json!(3)));
        assert!(FieldType::Enum.accepts(&json!(true)));
        assert!(!FieldType::Enum.accepts(&json!({"a": 1})));

        assert!(FieldType::Json.accepts(&json!({"a": 1})));
        assert!(FieldType::Json.accepts(&json!([1, 2])));
        assert!(!FieldType::Json.accepts(&json!("{}")));
    }

    #[test]
    fn null_matches_no_type() {
        for t in [
            FieldType::String,
            FieldType::Int,
            FieldType::Float,
            FieldType::Bool,
            FieldType::Enum,
            FieldType::Json,
        ] {
            assert!(!t.accepts(&Value::Null), "{t} accepted null");
        }
    }

    #[test]
    fn parses_wire_format() {
        let schema = Schema::from_value(&json!({
            "version": 2,
            "rules": {
                "timeout": {"type": "int", "required": true, "min": 1, "max": 60},
                "region": {"type": "enum", "allowed": ["us-east", "eu-west"], "default": "us-east"}
            }
        }))
        .unwrap();

        assert_eq!(schema.version, 2);
        let timeout = &schema.rules["timeout"];
        assert_eq!(timeout.field_type, FieldType::Int);
        assert!(timeout.required);
        assert_eq!(timeout.max, Some(60.0));
        assert_eq!(schema.rules["region"].default, Some(json!("us-east")));
    }

    #[test]
    fn unknown_type_is_an_invalid_schema() {
        let errors = Schema::from_value(&json!({"rules": {"a": {"type": "date"}}})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.messages()[0].starts_with("invalid schema:"));
    }

    #[test]
    fn definition_errors_cover_bounds_and_defaults() {
        let schema = Schema::new(1)
            .with_rule("name", FieldRule::new(FieldType::String).with_range(Some(1.0), None))
            .with_rule("retries", FieldRule::new(FieldType::Int).with_range(Some(5.0), Some(1.0)))
            .with_rule("ratio", FieldRule::new(FieldType::Float).with_default(json!("half")));

        let errors = schema.definition_errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|m| m.starts_with("schema: ")));
        assert!(errors.iter().any(|m| m.contains("'retries' has min 5 greater than max 1")));
    }

    #[test]
    fn well_formed_schema_has_no_definition_errors() {
        let schema = Schema::new(1)
            .with_rule("port", FieldRule::new(FieldType::Int).with_range(Some(1.0), Some(65535.0)))
            .with_rule("debug", FieldRule::new(FieldType::Bool).with_default(json!(false)));
        assert!(schema.definition_errors().is_empty());
    }
}
