//! Query string encoding with schema-driven coercion.
//!
//! Beyond plain `key=value` pairs, two bare forms keep every value
//! encodable:
//! - `key` (no `=`) is a `null` value
//! - `key[]` is an empty array

use serde_json::{Map, Number, Value};
use url::form_urlencoded;

use crate::codec::CodecError;
use crate::schema::Schema;

const EMPTY_ARRAY_SUFFIX: &str = "[]";

/// Values collected for one key. `None` entries are `null` occurrences.
type Occurrences = Vec<Option<String>>;

/// Decode a raw query string into an object.
///
/// Each key is coerced by the matching field of `schema` when it is an
/// object schema: arrays collect repeated keys, integers/numbers/booleans
/// are parsed. Keys without a field schema decode to a string, or to an
/// array of strings when repeated.
pub fn decode_query(raw: Option<&str>, schema: Option<&Schema>) -> Value {
    let mut grouped: Vec<(String, Occurrences)> = Vec::new();
    for piece in raw.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match piece.split_once('=') {
            Some(_) => match form_urlencoded::parse(piece.as_bytes()).next() {
                Some((k, v)) => (k.into_owned(), Some(Some(v.into_owned()))),
                None => continue,
            },
            None => match piece.strip_suffix(EMPTY_ARRAY_SUFFIX) {
                Some(name) => (decode_component(name), None),
                None => (decode_component(piece), Some(None)),
            },
        };

        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.extend(value),
            None => grouped.push((key, value.into_iter().collect())),
        }
    }

    let mut object = Map::new();
    for (key, values) in grouped {
        let field_schema = schema.and_then(|s| s.field(&key)).map(|f| &f.schema);
        object.insert(key, coerce_values(values, field_schema));
    }
    Value::Object(object)
}

fn decode_component(raw: &str) -> String {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}

fn coerce_values(mut values: Occurrences, schema: Option<&Schema>) -> Value {
    match schema {
        Some(Schema::Array { items }) => Value::Array(
            values
                .iter()
                .map(|v| coerce_occurrence(v.as_deref(), items))
                .collect(),
        ),
        Some(Schema::Nullable { inner }) if matches!(inner.as_ref(), Schema::Array { .. }) => {
            if values.len() == 1 && values[0].is_none() {
                Value::Null
            } else {
                coerce_values(values, Some(inner))
            }
        }
        Some(schema) => match values.pop() {
            Some(last) => coerce_occurrence(last.as_deref(), schema),
            None => Value::Array(Vec::new()),
        },
        None if values.len() == 1 => values
            .pop()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
        None => Value::Array(
            values
                .into_iter()
                .map(|v| v.map(Value::String).unwrap_or(Value::Null))
                .collect(),
        ),
    }
}

fn coerce_occurrence(raw: Option<&str>, schema: &Schema) -> Value {
    match raw {
        Some(raw) => coerce_scalar(raw, schema),
        None => Value::Null,
    }
}

fn coerce_scalar(raw: &str, schema: &Schema) -> Value {
    let parsed = match schema {
        Schema::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<u64>().map(Value::from))
            .ok(),
        Schema::Number => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        Schema::Bool => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Schema::Nullable { inner } => Some(coerce_scalar(raw, inner)),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Encode an input object as a query string. `None` means there is
/// nothing to send (`null` input or an empty object).
pub fn encode_query(input: &Value) -> Result<Option<String>, CodecError> {
    let object = match input {
        Value::Null => return Ok(None),
        Value::Object(object) => object,
        Value::Bool(_) => return Err(CodecError::QueryNotObject("boolean")),
        Value::Number(_) => return Err(CodecError::QueryNotObject("number")),
        Value::String(_) => return Err(CodecError::QueryNotObject("string")),
        Value::Array(_) => return Err(CodecError::QueryNotObject("array")),
    };

    let mut pieces: Vec<String> = Vec::new();
    for (key, value) in object {
        match value {
            Value::Array(items) if items.is_empty() => {
                pieces.push(format!("{}{}", encode_component(key), EMPTY_ARRAY_SUFFIX));
            }
            Value::Array(items) => {
                for item in items {
                    pieces.push(encode_pair(key, item)?);
                }
            }
            other => pieces.push(encode_pair(key, other)?),
        }
    }

    Ok((!pieces.is_empty()).then(|| pieces.join("&")))
}

fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

fn encode_pair(key: &str, value: &Value) -> Result<String, CodecError> {
    let text = match value {
        Value::Null => return Ok(encode_component(key)),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => {
            return Err(CodecError::NestedQueryValue(key.to_string()))
        }
    };
    Ok(format!("{}={}", encode_component(key), encode_component(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_schema() -> Schema {
        Schema::object()
            .required("q", Schema::string())
            .optional("page", Schema::integer())
            .optional("exact", Schema::boolean())
            .optional("tags", Schema::array(Schema::string()))
            .optional("ratio", Schema::number())
            .into()
    }

    #[test]
    fn test_decode_with_schema() {
        let value = decode_query(
            Some("q=rust+lang&page=2&exact=true&tags=a&tags=b&ratio=0.5"),
            Some(&search_schema()),
        );
        assert_eq!(
            value,
            json!({ "q": "rust lang", "page": 2, "exact": true, "tags": ["a", "b"], "ratio": 0.5 })
        );
    }

    #[test]
    fn test_decode_keeps_unparsable_as_string() {
        let value = decode_query(Some("q=x&page=two"), Some(&search_schema()));
        assert_eq!(value["page"], json!("two"));
    }

    #[test]
    fn test_decode_without_schema() {
        let value = decode_query(Some("firstName=Ada&tag=a&tag=b"), None);
        assert_eq!(value, json!({ "firstName": "Ada", "tag": ["a", "b"] }));
        assert_eq!(decode_query(None, None), json!({}));
    }

    #[test]
    fn test_string_field_keeps_digits() {
        let schema: Schema = Schema::object().required("code", Schema::string()).into();
        assert_eq!(decode_query(Some("code=007"), Some(&schema)), json!({ "code": "007" }));
    }

    #[test]
    fn test_encode() {
        let query = encode_query(&json!({
            "firstName": "Ada Lovelace",
            "page": 2,
            "tags": ["a", "b"],
            "skip": null
        }))
        .unwrap()
        .unwrap();
        assert_eq!(query, "firstName=Ada+Lovelace&page=2&skip&tags=a&tags=b");

        assert_eq!(encode_query(&Value::Null).unwrap(), None);
        assert_eq!(encode_query(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_encode_rejects_nesting() {
        assert!(matches!(
            encode_query(&json!({ "filter": { "a": 1 } })),
            Err(CodecError::NestedQueryValue(k)) if k == "filter"
        ));
        assert!(matches!(
            encode_query(&json!("text")),
            Err(CodecError::QueryNotObject("string"))
        ));
    }

    fn notes_schema() -> Schema {
        Schema::object()
            .required("tags", Schema::array(Schema::string()))
            .required("note", Schema::nullable(Schema::string()))
            .optional("labels", Schema::nullable(Schema::array(Schema::string())))
            .optional("scores", Schema::array(Schema::nullable(Schema::integer())))
            .into()
    }

    #[test]
    fn test_empty_array_and_null_survive() {
        let schema = notes_schema();
        for input in [
            json!({ "tags": [], "note": null }),
            json!({ "tags": ["a"], "note": "null", "labels": null }),
            json!({ "tags": [], "note": "", "labels": [], "scores": [1, null, 3] }),
            json!({ "tags": ["x y", "&="], "note": "a=b&c", "labels": ["l"] }),
        ] {
            let query = encode_query(&input).unwrap();
            assert_eq!(decode_query(query.as_deref(), Some(&schema)), input, "{:?}", query);
        }
    }

    #[test]
    fn test_bare_forms() {
        assert_eq!(
            encode_query(&json!({ "tags": [], "note": null })).unwrap().unwrap(),
            "note&tags[]"
        );
        assert_eq!(
            decode_query(Some("note&tags[]&q="), None),
            json!({ "note": null, "tags": [], "q": "" })
        );
        // an encoded key ending in brackets is an ordinary key
        assert_eq!(
            decode_query(Some("x%5B%5D"), None),
            json!({ "x[]": null })
        );
    }

    #[test]
    fn test_null_text_is_a_string() {
        let schema = notes_schema();
        let value = decode_query(Some("tags=a&note=null"), Some(&schema));
        assert_eq!(value["note"], json!("null"));
    }
}
