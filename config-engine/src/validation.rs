//! Schema Validator
//!
//! Pure checking of a payload against a [`Schema`]. Validation never stops
//! at the first problem: every rule is evaluated and every violation is
//! reported.
//!
//! Order of checks per rule:
//! 1. Absent field: required → violation; otherwise inject the default.
//! 2. Present field: base type check. A mismatch skips the constraints.
//! 3. Constraints on type-valid values: inclusive numeric bounds, then
//!    `allowed` membership by deep equality.
//!
//! Afterwards every payload key without a rule is reported as unknown.

use crate::schema::{kind_of, FieldRule, Schema};
use error_common::ValidationErrors;
use serde_json::{Map, Value};

/// A payload as submitted: field name to dynamically typed value
pub type Payload = Map<String, Value>;

/// Check `payload` against `schema`.
///
/// The input is never modified; on success the returned copy carries the
/// defaults of absent optional fields.
///
/// # Errors
///
/// Returns every violation found, in rule order followed by unknown fields.
pub fn validate(schema: &Schema, payload: &Payload) -> Result<Payload, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut accepted = payload.clone();

    for (field, rule) in &schema.rules {
        match payload.get(field) {
            None => {
                if rule.required {
                    errors.push(format!("field '{field}' is required"));
                } else if let Some(default) = &rule.default {
                    accepted.insert(field.clone(), default.clone());
                }
            }
            Some(value) if !rule.field_type.accepts(value) => {
                errors.push(format!(
                    "field '{field}' expected type {}, got {}",
                    rule.field_type,
                    kind_of(value)
                ));
            }
            Some(value) => {
                if let Some(message) = constraint_violation(field, value, rule) {
                    errors.push(message);
                }
            }
        }
    }

    for field in payload.keys() {
        if !schema.rules.contains_key(field) {
            errors.push(format!("unknown field '{field}' is not allowed by schema"));
        }
    }

    errors.into_result().map(|()| accepted)
}

/// Validate raw documents: parse the schema, check its rule definitions,
/// then check the payload.
///
/// # Errors
///
/// Returns the schema parse failure, the definition problems, or the
/// payload violations, whichever stage fails first.
pub fn validate_document(schema: &Value, config: &Value) -> Result<Payload, ValidationErrors> {
    let schema = Schema::from_value(schema)?;
    schema.definition_errors().into_result()?;

    let Value::Object(payload) = config else {
        return Err(ValidationErrors::from_messages([format!(
            "configuration must be an object, got {}",
            kind_of(config)
        )]));
    };

    validate(&schema, payload)
}

/// First failed constraint of a type-valid value; range is checked before
/// the allowed list.
fn constraint_violation(field: &str, value: &Value, rule: &FieldRule) -> Option<String> {
    if let Some(n) = value.as_f64() {
        if let Some(min) = rule.min.filter(|min| n < *min) {
            return Some(format!("field '{field}' must be >= {min}"));
        }
        if let Some(max) = rule.max.filter(|max| n > *max) {
            return Some(format!("field '{field}' must be <= {max}"));
        }
    }

    let allowed = rule.allowed.as_deref().filter(|a| !a.is_empty())?;
    if allowed.iter().any(|candidate| deep_equal(candidate, value)) {
        return None;
    }
    Some(format!(
        "field '{field}' has invalid value '{}'; allowed: {}",
        display_value(value),
        Value::Array(allowed.to_vec())
    ))
}

/// Structural equality where numbers compare by value, so `1` equals `1.0`
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equal(x, y)))
        }
        _ => a == b,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
