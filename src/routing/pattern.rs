//! Path patterns and segment matching.
//!
//! # Responsibilities
//! - Parse `/item/:id` style patterns into literal and parameter segments
//! - Match a request path segment-by-segment, binding parameter values
//! - Render a pattern back into concrete segments for outgoing calls
//!
//! # Design Decisions
//! - Literal segments compare exactly (case-sensitive)
//! - A parameter matches exactly one non-empty segment
//! - Parameter values are percent-decoded before binding
//! - One trailing slash on the request path is ignored
//! - No regex, no wildcards: O(segments) per pattern

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::routing::RouteError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        let mut segments = Vec::new();
        if rest.is_empty() {
            return Ok(Self {
                raw: raw.to_string(),
                segments,
            });
        }

        for part in rest.split('/') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            match part.strip_prefix(':') {
                Some(name) => {
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        return Err(invalid("parameter names use [A-Za-z0-9_]"));
                    }
                    if segments.iter().any(|s| matches!(s, Segment::Param(p) if p == name)) {
                        return Err(RouteError::DuplicateParam {
                            pattern: raw.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Same segments up to parameter naming: `/item/:id` and `/item/:key`
    /// can never be told apart at match time.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    /// Match a request path, returning bound parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = percent_decode_str(part).decode_utf8_lossy().into_owned();
                    params.insert(name.clone(), value);
                }
            }
        }
        Some(params)
    }

    /// Concrete (unencoded) segments with every parameter substituted.
    pub fn render(&self, params: &PathParams) -> Result<Vec<String>, RouteError> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(literal) => Ok(literal.clone()),
                Segment::Param(name) => params
                    .get(name)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| RouteError::MissingParam {
                        pattern: self.raw.clone(),
                        name: name.clone(),
                    }),
            })
            .collect()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parameter values bound from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathParams(BTreeMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build from a serializable params struct. Scalars are stringified;
    /// `()` and `null` give no parameters.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let mut params = Self::default();
        match serde_json::to_value(value)? {
            Value::Null => {}
            Value::Object(map) => {
                for (name, value) in map {
                    let text = match value {
                        Value::String(s) => s,
                        Value::Null => continue,
                        other => other.to_string(),
                    };
                    params.insert(name, text);
                }
            }
            other => {
                return Err(serde::de::Error::custom(format!(
                    "path parameters must serialize to an object, got {}",
                    other
                )))
            }
        }
        Ok(params)
    }

    /// Deserialize into a typed params struct. String fields take the raw
    /// text; numeric and boolean fields are parsed from it.
    /// An empty set also deserializes into `()`.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.0.is_empty() {
            if let Ok(unit) = serde_json::from_value(Value::Null) {
                return Ok(unit);
            }
        }
        let raw: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        match serde_json::from_value(Value::Object(raw)) {
            Ok(typed) => Ok(typed),
            Err(first) => {
                let parsed: Map<String, Value> = self
                    .0
                    .iter()
                    .map(|(k, v)| {
                        let value = match serde_json::from_str::<Value>(v) {
                            Ok(scalar @ (Value::Number(_) | Value::Bool(_))) => scalar,
                            _ => Value::String(v.clone()),
                        };
                        (k.clone(), value)
                    })
                    .collect();
                serde_json::from_value(Value::Object(parsed)).map_err(|_| first)
            }
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        let pattern = PathPattern::parse("/users/:id/posts").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Param("id".into()),
                Segment::Literal("posts".into()),
            ]
        );
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["id"]);
        assert!(PathPattern::parse("/").unwrap().segments().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_patterns() {
        for raw in ["methods/get", "/a//b", "/a/:", "/a/:bad-name", ""] {
            assert!(
                matches!(PathPattern::parse(raw), Err(RouteError::InvalidPattern { .. })),
                "{raw} should be rejected"
            );
        }
        assert!(matches!(
            PathPattern::parse("/a/:id/b/:id"),
            Err(RouteError::DuplicateParam { name, .. }) if name == "id"
        ));
    }

    #[test]
    fn test_match_literals_and_params() {
        let pattern = PathPattern::parse("/item/:id").unwrap();

        let params = pattern.matches("/item/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));

        assert!(pattern.matches("/item").is_none());
        assert!(pattern.matches("/item/42/extra").is_none());
        assert!(pattern.matches("/Item/42").is_none());
        assert!(pattern.matches("/item/").is_none());
        assert!(pattern.matches("/item/42/").is_some());
    }

    #[test]
    fn test_match_decodes_params() {
        let pattern = PathPattern::parse("/hello/:name").unwrap();
        let params = pattern.matches("/hello/Ada%20Lovelace").unwrap();
        assert_eq!(params.get("name"), Some("Ada Lovelace"));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/x").is_none());
    }

    #[test]
    fn test_same_shape() {
        let a = PathPattern::parse("/item/:id").unwrap();
        let b = PathPattern::parse("/item/:key").unwrap();
        let c = PathPattern::parse("/item/new").unwrap();
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_render() {
        let pattern = PathPattern::parse("/users/:id/posts").unwrap();
        let params = PathParams::new().with("id", "7");
        assert_eq!(pattern.render(&params).unwrap(), vec!["users", "7", "posts"]);
        assert!(matches!(
            pattern.render(&PathParams::new()),
            Err(RouteError::MissingParam { name, .. }) if name == "id"
        ));
    }

    #[test]
    fn test_typed_params() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct ItemParams {
            id: u64,
        }
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct CodeParams {
            code: String,
        }

        let params = PathParams::new().with("id", "42");
        assert_eq!(params.deserialize_into::<ItemParams>().unwrap(), ItemParams { id: 42 });

        let params = PathParams::new().with("code", "007");
        assert_eq!(
            params.deserialize_into::<CodeParams>().unwrap(),
            CodeParams { code: "007".into() }
        );

        let params = PathParams::from_serialize(&ItemParams { id: 9 }).unwrap();
        assert_eq!(params.get("id"), Some("9"));
        assert!(PathParams::from_serialize(&()).unwrap().is_empty());
        PathParams::new().deserialize_into::<()>().unwrap();
    }
}
