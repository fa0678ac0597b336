//! Field-length limit enforced by the ingestion proxy.
//!
//! Every string in an event body, at any depth, must be at most [`MAX_FIELD_LENGTH`]
//! characters long. Oversized fields are reported by their JSON path, e.g.
//! `events[0].event_properties.referrer`.
use serde_json::{json, Map, Value};
use std::fmt;

pub const MAX_FIELD_LENGTH: usize = 500;

/// A string field longer than [`MAX_FIELD_LENGTH`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    pub path: String,
    pub length: usize,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({} chars)", self.path, self.length)
    }
}

/// Collect every string field in `value` that exceeds the limit.
pub fn validate_field_lengths(value: &Value) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    visit(value, String::new(), &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn visit(value: &Value, path: String, violations: &mut Vec<FieldViolation>) {
    match value {
        Value::String(s) => {
            let length = s.chars().count();
            if length > MAX_FIELD_LENGTH {
                violations.push(FieldViolation { path, length });
            }
        }
        Value::Object(map) => visit_object(map, &path, violations),
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                visit(item, format!("{path}[{idx}]"), violations);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn visit_object(map: &Map<String, Value>, path: &str, violations: &mut Vec<FieldViolation>) {
    for (key, value) in map {
        let path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        visit(value, path, violations);
    }
}

/// JSON body the proxy answers a rejected event with.
pub fn error_body(violations: &[FieldViolation]) -> Value {
    let fields = violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    json!({
        "error": "field_length_exceeded",
        "message": format!(
            "{} field(s) exceed the maximum length of {MAX_FIELD_LENGTH} characters: {fields}",
            violations.len()
        ),
        "limit": MAX_FIELD_LENGTH,
        "violations": violations
            .iter()
            .map(|v| json!({ "field": v.path, "length": v.length }))
            .collect::<Vec<_>>(),
    })
}
