//! Route manifest: the serializable shape of a route table.
//!
//! The manifest carries no handlers, only what a client needs to build a
//! proxy: method, pattern, and the input/output schemas. A server exports
//! it (see `http::server`), a client consumes it.

use serde::{Deserialize, Serialize};

use crate::routing::Method;
use crate::schema::{describe, Schema};

/// Shape of one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteShape {
    pub method: Method,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Schema>,
}

impl RouteShape {
    /// One-line signature, e.g. `GET /hello1 ({ firstName: string }) -> string`.
    pub fn signature(&self) -> String {
        let input = self.input.as_ref().map(describe).unwrap_or_default();
        let output = self
            .output
            .as_ref()
            .map(describe)
            .unwrap_or_else(|| "unknown".to_string());
        format!("{} {} ({}) -> {}", self.method, self.path, input, output)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteManifest {
    pub routes: Vec<RouteShape>,
}

impl RouteManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe a route by hand, for clients that share no code with the
    /// server.
    pub fn with_route(
        mut self,
        method: Method,
        path: impl Into<String>,
        input: Option<Schema>,
        output: Option<Schema>,
    ) -> Self {
        self.routes.push(RouteShape {
            method,
            path: path.into(),
            input,
            output,
        });
        self
    }

    pub fn find(&self, method: Method, path: &str) -> Option<&RouteShape> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        let shape = RouteShape {
            method: Method::Get,
            path: "/hello1".into(),
            input: Some(
                Schema::object()
                    .required("firstName", Schema::string())
                    .into(),
            ),
            output: Some(Schema::string()),
        };
        assert_eq!(
            shape.signature(),
            "GET /hello1 ({ firstName: string }) -> string"
        );
    }

    #[test]
    fn test_wire_form() {
        let manifest = RouteManifest::new().with_route(Method::Get, "/methods/get", None, None);
        let json = serde_json::to_string(&manifest).unwrap();
        assert_eq!(json, r#"{"routes":[{"method":"GET","path":"/methods/get"}]}"#);

        let back: RouteManifest = serde_json::from_str(&json).unwrap();
        assert!(back.find(Method::Get, "/methods/get").is_some());
        assert!(back.find(Method::Post, "/methods/get").is_none());
    }
}
