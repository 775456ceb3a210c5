//! Route table construction and lookup.
//!
//! # Responsibilities
//! - Accumulate route definitions through a chaining builder
//! - Enforce unique (method, pattern) pairs
//! - Freeze the result into an immutable, shareable table
//! - Look up the route for an incoming method + path
//!
//! # Design Decisions
//! - Registration never fails mid-chain; problems surface from build()
//! - Duplicate (method, pattern) is an error, the first registration is kept
//! - Lookup is a linear scan in registration order (first match wins)

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::dispatch::handler::{handler, BoxedHandler, HandlerError, HandlerInput, HandlerResult};
use crate::routing::{
    BuildError, Endpoint, Method, PathParams, PathPattern, RouteError, RouteManifest, RouteShape,
};
use crate::schema::Schema;

/// One registered route.
#[derive(Clone)]
pub struct RouteDefinition {
    pub method: Method,
    pub pattern: PathPattern,
    pub input_schema: Option<Schema>,
    pub output_schema: Option<Schema>,
    handler: BoxedHandler,
}

impl RouteDefinition {
    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    pub fn shape(&self) -> RouteShape {
        RouteShape {
            method: self.method,
            path: self.pattern.as_str().to_string(),
            input: self.input_schema.clone(),
            output: self.output_schema.clone(),
        }
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("input_schema", &self.input_schema)
            .field("output_schema", &self.output_schema)
            .finish_non_exhaustive()
    }
}

/// Handler plus optional schemas, for the verb shorthands on the builder.
pub struct RouteSpec {
    handler: BoxedHandler,
    input: Option<Schema>,
    output: Option<Schema>,
}

impl RouteSpec {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HandlerInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::from_handler(handler(f))
    }

    pub fn from_handler(handler: BoxedHandler) -> Self {
        Self {
            handler,
            input: None,
            output: None,
        }
    }

    pub fn input(mut self, schema: impl Into<Schema>) -> Self {
        self.input = Some(schema.into());
        self
    }

    pub fn output(mut self, schema: impl Into<Schema>) -> Self {
        self.output = Some(schema.into());
        self
    }
}

/// Chaining builder for a [`RouteTable`].
#[derive(Default)]
pub struct RouteTableBuilder {
    routes: Vec<RouteDefinition>,
    errors: Vec<RouteError>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Invalid patterns and duplicates are recorded and
    /// reported by [`build`](Self::build).
    pub fn register(
        mut self,
        method: Method,
        pattern: &str,
        input: Option<Schema>,
        output: Option<Schema>,
        handler: BoxedHandler,
    ) -> Self {
        match PathPattern::parse(pattern) {
            Ok(pattern) => self.insert(RouteDefinition {
                method,
                pattern,
                input_schema: input,
                output_schema: output,
                handler,
            }),
            Err(e) => self.errors.push(e),
        }
        self
    }

    pub fn route(self, method: Method, pattern: &str, spec: RouteSpec) -> Self {
        self.register(method, pattern, spec.input, spec.output, spec.handler)
    }

    pub fn get(self, pattern: &str, spec: RouteSpec) -> Self {
        self.route(Method::Get, pattern, spec)
    }

    pub fn post(self, pattern: &str, spec: RouteSpec) -> Self {
        self.route(Method::Post, pattern, spec)
    }

    pub fn put(self, pattern: &str, spec: RouteSpec) -> Self {
        self.route(Method::Put, pattern, spec)
    }

    pub fn patch(self, pattern: &str, spec: RouteSpec) -> Self {
        self.route(Method::Patch, pattern, spec)
    }

    pub fn delete(self, pattern: &str, spec: RouteSpec) -> Self {
        self.route(Method::Delete, pattern, spec)
    }

    pub fn options(self, pattern: &str, spec: RouteSpec) -> Self {
        self.route(Method::Options, pattern, spec)
    }

    pub fn head(self, pattern: &str, spec: RouteSpec) -> Self {
        self.route(Method::Head, pattern, spec)
    }

    /// Mount every route of `group` under a literal `prefix`
    /// (`/methods` + `/get` → `/methods/get`).
    pub fn merge(mut self, prefix: &str, group: RouteTableBuilder) -> Self {
        self.errors.extend(group.errors);

        let prefix = prefix.trim_end_matches('/');
        for route in group.routes {
            let joined = match route.pattern.as_str() {
                "/" if !prefix.is_empty() => prefix.to_string(),
                path => format!("{}{}", prefix, path),
            };
            match PathPattern::parse(&joined) {
                Ok(pattern) => self.insert(RouteDefinition { pattern, ..route }),
                Err(e) => self.errors.push(e),
            }
        }
        self
    }

    /// Register a typed endpoint. Schemas come from the endpoint's
    /// associated types; path parameters and input are deserialized into
    /// them before `f` runs.
    pub fn endpoint<E, F, Fut>(self, f: F) -> Self
    where
        E: Endpoint,
        F: Fn(E::Params, E::Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<E::Output, HandlerError>> + Send + 'static,
    {
        let input_schema = E::input_schema();
        let takes_input = input_schema.is_some();
        let f = Arc::new(f);

        let typed = handler(move |request: HandlerInput| {
            let f = Arc::clone(&f);
            async move {
                let params: E::Params = request.params.deserialize_into().map_err(|e| {
                    HandlerError::bad_request(format!("path parameters do not fit: {}", e))
                })?;
                let input: E::Input = if takes_input {
                    serde_json::from_value(request.input)
                } else {
                    serde_json::from_value(serde_json::Value::Null)
                }
                .map_err(|e| HandlerError::bad_request(format!("input does not fit: {}", e)))?;

                let output = f(params, input).await?;
                serde_json::to_value(output)
                    .map_err(|e| HandlerError::internal(format!("output not serializable: {}", e)))
            }
        });

        self.register(E::METHOD, E::PATH, input_schema, E::output_schema(), typed)
    }

    /// Freeze the table, or report every registration problem.
    pub fn build(self) -> Result<RouteTable, BuildError> {
        if !self.errors.is_empty() {
            return Err(BuildError {
                errors: self.errors,
            });
        }
        Ok(RouteTable {
            routes: self.routes,
        })
    }

    fn insert(&mut self, route: RouteDefinition) {
        let duplicate = self
            .routes
            .iter()
            .any(|r| r.method == route.method && r.pattern.same_shape(&route.pattern));
        if duplicate {
            self.errors.push(RouteError::DuplicateRoute {
                method: route.method,
                pattern: route.pattern.as_str().to_string(),
            });
        } else {
            self.routes.push(route);
        }
    }
}

/// Immutable registry of routes, safe to share across request tasks.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First route (in registration order) matching method and path.
    pub fn find(&self, method: Method, path: &str) -> Option<(&RouteDefinition, PathParams)> {
        self.routes
            .iter()
            .filter(|r| r.method == method)
            .find_map(|r| r.pattern.matches(path).map(|params| (r, params)))
    }

    /// Serializable shape of every route, for clients.
    pub fn manifest(&self) -> RouteManifest {
        RouteManifest {
            routes: self.routes.iter().map(RouteDefinition::shape).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(reply: &'static str) -> RouteSpec {
        RouteSpec::new(move |_| async move { Ok(json!(reply)) })
    }

    #[test]
    fn test_build_and_find() {
        let table = RouteTable::builder()
            .get("/methods/get", text("GET request"))
            .post("/methods/post", text("POST request"))
            .get("/item/:id", text("item"))
            .build()
            .unwrap();

        assert_eq!(table.len(), 3);
        let (route, params) = table.find(Method::Get, "/item/9").unwrap();
        assert_eq!(route.pattern.as_str(), "/item/:id");
        assert_eq!(params.get("id"), Some("9"));

        assert!(table.find(Method::Post, "/methods/get").is_none());
        assert!(table.find(Method::Get, "/nope").is_none());
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let err = RouteTable::builder()
            .get("/item/:id", text("first"))
            .get("/item/:key", text("second"))
            .post("/item/:id", text("other method is fine"))
            .build()
            .unwrap_err();

        assert_eq!(
            err.errors,
            vec![RouteError::DuplicateRoute {
                method: Method::Get,
                pattern: "/item/:key".into(),
            }]
        );
    }

    #[test]
    fn test_build_reports_every_error() {
        let err = RouteTable::builder()
            .get("no-slash", text("x"))
            .get("/a/:id/:id", text("x"))
            .get("/ok", text("x"))
            .get("/ok", text("x"))
            .build()
            .unwrap_err();

        assert_eq!(err.errors.len(), 3);
        assert!(matches!(err.errors[0], RouteError::InvalidPattern { .. }));
        assert!(matches!(err.errors[1], RouteError::DuplicateParam { .. }));
        assert!(matches!(err.errors[2], RouteError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_first_registration_wins_on_overlap() {
        let table = RouteTable::builder()
            .get("/item/new", text("literal"))
            .get("/item/:id", text("param"))
            .build()
            .unwrap();

        let (route, params) = table.find(Method::Get, "/item/new").unwrap();
        assert_eq!(route.pattern.as_str(), "/item/new");
        assert!(params.is_empty());
    }

    #[test]
    fn test_merge_prefixes_group() {
        let group = RouteTable::builder()
            .get("/", text("index"))
            .get("/get", text("GET request"));
        let table = RouteTable::builder()
            .merge("/methods/", group)
            .build()
            .unwrap();

        let paths: Vec<&str> = table.routes().iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(paths, vec!["/methods", "/methods/get"]);
    }

    #[test]
    fn test_manifest_keeps_order_and_schemas() {
        let table = RouteTable::builder()
            .get(
                "/hello1",
                text("hi").input(Schema::object().required("firstName", Schema::string())),
            )
            .delete("/item/:id", text("gone").output(Schema::string()))
            .build()
            .unwrap();

        let manifest = table.manifest();
        assert_eq!(manifest.routes.len(), 2);
        assert_eq!(manifest.routes[0].path, "/hello1");
        assert!(manifest.routes[0].input.is_some());
        assert_eq!(manifest.routes[1].method, Method::Delete);
        assert_eq!(manifest.routes[1].output, Some(Schema::string()));
    }
}
