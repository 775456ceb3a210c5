//! Schema validation.
//!
//! # Responsibilities
//! - Check a decoded value against a [`Schema`]
//! - Report every violation with the path of the offending field
//!
//! # Design Decisions
//! - Paths are JSON-pointer style (`/items/0/name`), root is `/`
//! - Integer accepts floats with no fractional part (`3.0`)
//! - Missing optional fields are fine; a present optional field must match

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::types::{ObjectSchema, Schema};

/// One failing location within a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

/// A value does not satisfy its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Paths of all failing fields, in discovery order.
    pub fn paths(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.path.as_str()).collect()
    }
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.path, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate `value` against `schema`.
pub fn validate(value: &Value, schema: &Schema) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    let mut path = Vec::new();
    check(value, schema, &mut path, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

fn check(value: &Value, schema: &Schema, path: &mut Vec<String>, issues: &mut Vec<FieldIssue>) {
    match schema {
        Schema::Any => {}
        Schema::Null => expect(value.is_null(), "null", value, path, issues),
        Schema::Bool => expect(value.is_boolean(), "boolean", value, path, issues),
        Schema::Integer => expect(is_integer(value), "integer", value, path, issues),
        Schema::Number => expect(value.is_number(), "number", value, path, issues),
        Schema::String => expect(value.is_string(), "string", value, path, issues),
        Schema::Nullable { inner } => {
            if !value.is_null() {
                check(value, inner, path, issues);
            }
        }
        Schema::Array { items } => match value.as_array() {
            Some(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    path.push(i.to_string());
                    check(element, items, path, issues);
                    path.pop();
                }
            }
            None => expect(false, "array", value, path, issues),
        },
        Schema::Object(object) => check_object(value, object, path, issues),
    }
}

fn check_object(
    value: &Value,
    object: &ObjectSchema,
    path: &mut Vec<String>,
    issues: &mut Vec<FieldIssue>,
) {
    let Some(map) = value.as_object() else {
        expect(false, "object", value, path, issues);
        return;
    };

    for field in &object.fields {
        path.push(field.name.clone());
        match map.get(&field.name) {
            Some(member) => check(member, &field.schema, path, issues),
            None if field.required => issues.push(FieldIssue {
                path: render(path),
                message: "required field is missing".to_string(),
            }),
            None => {}
        }
        path.pop();
    }

    if object.strict {
        for key in map.keys() {
            if object.field(key).is_none() {
                path.push(key.clone());
                issues.push(FieldIssue {
                    path: render(path),
                    message: "unknown field".to_string(),
                });
                path.pop();
            }
        }
    }
}

fn expect(
    ok: bool,
    expected: &str,
    value: &Value,
    path: &[String],
    issues: &mut Vec<FieldIssue>,
) {
    if !ok {
        issues.push(FieldIssue {
            path: render(path),
            message: format!("expected {}, found {}", expected, kind_of(value)),
        });
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
        }
        _ => false,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render(path: &[String]) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", path.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> Schema {
        Schema::object()
            .required("firstName", Schema::string())
            .required("lastName", Schema::string())
            .optional("age", Schema::integer())
            .into()
    }

    #[test]
    fn test_valid_object() {
        let value = json!({ "firstName": "Ada", "lastName": "Lovelace", "extra": true });
        assert!(validate(&value, &person()).is_ok());
    }

    #[test]
    fn test_reports_all_failures() {
        let value = json!({ "firstName": 7, "age": "old" });
        let err = validate(&value, &person()).unwrap_err();
        assert_eq!(err.paths(), vec!["/firstName", "/lastName", "/age"]);
        assert_eq!(err.issues[0].message, "expected string, found number");
        assert_eq!(err.issues[1].message, "required field is missing");
    }

    #[test]
    fn test_nested_paths() {
        let schema = Schema::array(
            Schema::object()
                .required("tags", Schema::array(Schema::string()))
                .into(),
        );
        let value = json!([{ "tags": ["a"] }, { "tags": ["b", 3] }]);
        let err = validate(&value, &schema).unwrap_err();
        assert_eq!(err.paths(), vec!["/1/tags/1"]);
    }

    #[test]
    fn test_root_mismatch() {
        let err = validate(&json!("x"), &Schema::integer()).unwrap_err();
        assert_eq!(err.paths(), vec!["/"]);
    }

    #[test]
    fn test_integer_and_nullable() {
        assert!(validate(&json!(3.0), &Schema::integer()).is_ok());
        assert!(validate(&json!(3.5), &Schema::integer()).is_err());
        assert!(validate(&json!(3.5), &Schema::number()).is_ok());

        let schema = Schema::nullable(Schema::string());
        assert!(validate(&Value::Null, &schema).is_ok());
        assert!(validate(&json!("x"), &schema).is_ok());
        assert!(validate(&json!(1), &schema).is_err());
    }

    #[test]
    fn test_strict_object_rejects_unknown() {
        let schema: Schema = Schema::object()
            .required("id", Schema::integer())
            .strict()
            .into();
        let err = validate(&json!({ "id": 1, "name": "x" }), &schema).unwrap_err();
        assert_eq!(err.paths(), vec!["/name"]);
        assert_eq!(err.issues[0].message, "unknown field");
    }

    #[test]
    fn test_display_lists_issues() {
        let err = validate(&json!({}), &person()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema validation failed: /firstName: required field is missing; /lastName: required field is missing"
        );
    }
}
