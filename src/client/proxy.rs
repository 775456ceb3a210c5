//! Route-shaped client proxy.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use serde_json::Value;
use url::Url;

use crate::client::error::{ClientError, ContractMismatch, TransportError};
use crate::codec::{decode_body, encode_body, encode_query};
use crate::config::ClientConfig;
use crate::dispatch::X_RPC_ERROR;
use crate::http::MANIFEST_PATH;
use crate::observability::metrics;
use crate::routing::{
    Endpoint, Method, PathParams, PathPattern, RouteManifest, RouteTable, Segment,
};
use crate::schema::{validate, Schema};

/// Callable mirror of a route table, bound to one base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ClientProxy {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    base: Url,
    http: reqwest::Client,
    manifest: RouteManifest,
    routes: Vec<ProxyRoute>,
}

#[derive(Debug, Clone)]
struct ProxyRoute {
    method: Method,
    pattern: PathPattern,
    output: Option<Schema>,
}

impl ClientProxy {
    pub fn new(base_url: &str, manifest: &RouteManifest) -> Result<Self, ClientError> {
        Self::with_config(base_url, manifest, &ClientConfig::default())
    }

    pub fn with_config(
        base_url: &str,
        manifest: &RouteManifest,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        Self::with_http_client(base_url, manifest, http_client(config)?)
    }

    /// Share an existing `reqwest::Client` (and its pool).
    pub fn with_http_client(
        base_url: &str,
        manifest: &RouteManifest,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        let base = parse_base(base_url)?;
        let routes = manifest
            .routes
            .iter()
            .map(|shape| {
                Ok(ProxyRoute {
                    method: shape.method,
                    pattern: PathPattern::parse(&shape.path)?,
                    output: shape.output.clone(),
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        Ok(Self {
            inner: Arc::new(Inner {
                base,
                http,
                manifest: manifest.clone(),
                routes,
            }),
        })
    }

    /// Proxy for a table linked into this process.
    pub fn from_table(base_url: &str, table: &RouteTable) -> Result<Self, ClientError> {
        Self::new(base_url, &table.manifest())
    }

    /// Proxy with no route shape, for [`endpoint`](Self::endpoint) calls only.
    pub fn for_endpoints(base_url: &str) -> Result<Self, ClientError> {
        Self::new(base_url, &RouteManifest::default())
    }

    /// Fetch the server's manifest and build a proxy from it.
    pub async fn discover(base_url: &str) -> Result<Self, ClientError> {
        Self::discover_with_config(base_url, &ClientConfig::default()).await
    }

    pub async fn discover_with_config(
        base_url: &str,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        let http = http_client(config)?;
        let base = parse_base(base_url)?;
        let url = extend_base(&base, [MANIFEST_PATH.trim_start_matches('/')])?;

        let response = http.get(url).send().await.map_err(TransportError::Request)?;
        let status = response.status();
        let content_type = header_text(response.headers(), CONTENT_TYPE.as_str());
        let kind = header_text(response.headers(), X_RPC_ERROR);
        let bytes = response.bytes().await.map_err(TransportError::Request)?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                kind,
                payload: error_payload(content_type.as_deref(), &bytes),
            });
        }
        let manifest: RouteManifest =
            serde_json::from_slice(&bytes).map_err(ContractMismatch::Typed)?;

        tracing::debug!(base = %base, routes = manifest.routes.len(), "Route manifest discovered");
        Self::with_http_client(base_url, &manifest, http)
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// The route shapes this proxy was built from.
    pub fn manifest(&self) -> &RouteManifest {
        &self.inner.manifest
    }

    /// Every callable (method, pattern) pair, in manifest order.
    pub fn paths(&self) -> Vec<(Method, String)> {
        self.inner
            .routes
            .iter()
            .map(|r| (r.method, r.pattern.as_str().to_string()))
            .collect()
    }

    pub fn root(&self) -> ProxyNode {
        ProxyNode {
            proxy: self.clone(),
            steps: Vec::new(),
        }
    }

    /// Shorthand for `root().at(segment)`.
    pub fn at(&self, segment: &str) -> Result<ProxyNode, ClientError> {
        self.root().at(segment)
    }

    /// Call a typed endpoint. Needs no manifest entry: the route shape
    /// comes from `E` itself.
    pub async fn endpoint<E: Endpoint>(
        &self,
        params: &E::Params,
        input: &E::Input,
    ) -> Result<E::Output, ClientError> {
        let pattern = PathPattern::parse(E::PATH)?;
        let params = PathParams::from_serialize(params)?;
        let input = serde_json::to_value(input)?;
        let output = E::output_schema();

        let value = self
            .execute(E::METHOD, &pattern, &params, &input, output.as_ref())
            .await?;
        serde_json::from_value(value).map_err(|e| ContractMismatch::Typed(e).into())
    }

    async fn execute(
        &self,
        method: Method,
        pattern: &PathPattern,
        params: &PathParams,
        input: &Value,
        output: Option<&Schema>,
    ) -> Result<Value, ClientError> {
        let result = self.send(method, pattern, params, input, output).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_client_call(method.as_str(), pattern.as_str(), outcome);
        result
    }

    async fn send(
        &self,
        method: Method,
        pattern: &PathPattern,
        params: &PathParams,
        input: &Value,
        output: Option<&Schema>,
    ) -> Result<Value, ClientError> {
        let segments = pattern.render(params)?;
        let mut url = extend_base(&self.inner.base, segments.iter().map(String::as_str))?;

        let request = if method.carries_body() {
            let request = self.inner.http.request(method.into(), url.clone());
            if input.is_null() {
                request
            } else {
                let body = encode_body(input)?;
                request
                    .header(CONTENT_TYPE, body.content_type)
                    .body(body.bytes)
            }
        } else {
            if let Some(query) = encode_query(input)? {
                url.set_query(Some(&query));
            }
            self.inner.http.request(method.into(), url.clone())
        };

        tracing::debug!(method = %method, url = %url, route = pattern.as_str(), "Calling route");
        let response = request.send().await.map_err(TransportError::Request)?;

        let status = response.status();
        let content_type = header_text(response.headers(), CONTENT_TYPE.as_str());
        let kind = header_text(response.headers(), X_RPC_ERROR);
        let bytes = response.bytes().await.map_err(TransportError::Request)?;

        if !status.is_success() {
            let payload = error_payload(content_type.as_deref(), &bytes);
            tracing::debug!(status = %status, kind = ?kind, route = pattern.as_str(), "Route returned an error");
            return Err(ClientError::Status {
                status,
                kind,
                payload,
            });
        }

        // HEAD responses never carry the body the route would produce.
        if method == Method::Head {
            return Ok(Value::Null);
        }

        let value =
            decode_body(content_type.as_deref(), &bytes).map_err(ContractMismatch::Undecodable)?;
        if let Some(schema) = output {
            validate(&value, schema).map_err(ContractMismatch::Schema)?;
        }
        Ok(value)
    }
}

fn http_client(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build()
        .map_err(|e| TransportError::Request(e).into())
}

/// Append path segments below the base URL's own path, so a base of
/// `http://host/api` keeps its `/api` prefix.
fn extend_base<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidBaseUrl {
            url: base.to_string(),
            reason: "cannot be a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse_base(base_url: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };
    let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("cannot be a base".to_string()));
    }
    Ok(base)
}

fn error_payload(content_type: Option<&str>, bytes: &[u8]) -> Value {
    decode_body(content_type, bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn header_text(headers: &reqwest::header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
enum Step {
    Literal(String),
    Param { name: String, value: String },
}

impl Step {
    fn fits(&self, segment: &Segment) -> bool {
        match (self, segment) {
            (Step::Literal(a), Segment::Literal(b)) => a == b,
            (Step::Param { name, .. }, Segment::Param(b)) => name == b,
            _ => false,
        }
    }
}

/// A position inside the proxy's route tree.
///
/// Literal segments are reached with [`at`](Self::at), parameter segments
/// with [`param`](Self::param); a terminal call issues the request for the
/// route ending exactly here.
#[derive(Debug, Clone)]
pub struct ProxyNode {
    proxy: ClientProxy,
    steps: Vec<Step>,
}

impl ProxyNode {
    fn routes_below(&self) -> impl Iterator<Item = &ProxyRoute> {
        self.proxy.inner.routes.iter().filter(move |r| {
            let segments = r.pattern.segments();
            segments.len() >= self.steps.len()
                && self.steps.iter().zip(segments).all(|(s, seg)| s.fits(seg))
        })
    }

    fn child(&self, step: Step) -> Option<ProxyNode> {
        let depth = self.steps.len();
        let exists = self
            .routes_below()
            .any(|r| r.pattern.segments().get(depth).is_some_and(|seg| step.fits(seg)));
        exists.then(|| {
            let mut steps = self.steps.clone();
            steps.push(step);
            ProxyNode {
                proxy: self.proxy.clone(),
                steps,
            }
        })
    }

    /// Descend into a literal segment.
    pub fn at(&self, segment: &str) -> Result<ProxyNode, ClientError> {
        self.child(Step::Literal(segment.to_string()))
            .ok_or_else(|| ClientError::UnknownRoute(format!("{}/{}", self.trail(), segment)))
    }

    /// Bind the parameter segment `:name` to `value`.
    pub fn param(&self, name: &str, value: impl fmt::Display) -> Result<ProxyNode, ClientError> {
        self.child(Step::Param {
            name: name.to_string(),
            value: value.to_string(),
        })
        .ok_or_else(|| ClientError::UnknownRoute(format!("{}/:{}", self.trail(), name)))
    }

    /// Names reachable from here: literals as-is, parameters as `:name`.
    pub fn members(&self) -> Vec<String> {
        let depth = self.steps.len();
        let mut members: Vec<String> = Vec::new();
        for route in self.routes_below() {
            let name = match route.pattern.segments().get(depth) {
                Some(Segment::Literal(l)) => l.clone(),
                Some(Segment::Param(p)) => format!(":{}", p),
                None => continue,
            };
            if !members.contains(&name) {
                members.push(name);
            }
        }
        members
    }

    /// Methods callable on the route ending at this node.
    pub fn methods(&self) -> Vec<Method> {
        self.routes_below()
            .filter(|r| r.pattern.segments().len() == self.steps.len())
            .map(|r| r.method)
            .collect()
    }

    /// Call the route ending here with `method`.
    pub async fn call(&self, method: Method, input: &Value) -> Result<Value, ClientError> {
        let depth = self.steps.len();
        let route = self
            .routes_below()
            .find(|r| r.method == method && r.pattern.segments().len() == depth)
            .ok_or_else(|| ClientError::UnknownRoute(format!("{} {}", method, self.trail())))?;

        let mut params = PathParams::new();
        for step in &self.steps {
            if let Step::Param { name, value } = step {
                params.insert(name.clone(), value.clone());
            }
        }

        self.proxy
            .execute(method, &route.pattern, &params, input, route.output.as_ref())
            .await
    }

    /// Like [`call`](Self::call), but gives up when `abort` resolves first.
    /// The in-flight request is dropped and `TransportError::Aborted` returned.
    pub async fn call_with_abort<A>(
        &self,
        method: Method,
        input: &Value,
        abort: A,
    ) -> Result<Value, ClientError>
    where
        A: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = abort => {
                tracing::debug!(method = %method, path = %self.trail(), "Call aborted");
                Err(TransportError::Aborted.into())
            }
            result = self.call(method, input) => result,
        }
    }

    pub async fn get(&self, input: Value) -> Result<Value, ClientError> {
        self.call(Method::Get, &input).await
    }

    pub async fn post(&self, input: Value) -> Result<Value, ClientError> {
        self.call(Method::Post, &input).await
    }

    pub async fn put(&self, input: Value) -> Result<Value, ClientError> {
        self.call(Method::Put, &input).await
    }

    pub async fn patch(&self, input: Value) -> Result<Value, ClientError> {
        self.call(Method::Patch, &input).await
    }

    pub async fn delete(&self, input: Value) -> Result<Value, ClientError> {
        self.call(Method::Delete, &input).await
    }

    pub async fn options(&self, input: Value) -> Result<Value, ClientError> {
        self.call(Method::Options, &input).await
    }

    pub async fn head(&self, input: Value) -> Result<Value, ClientError> {
        self.call(Method::Head, &input).await
    }

    /// Concrete path walked so far, e.g. `/item/42`.
    fn trail(&self) -> String {
        let parts: Vec<&str> = self
            .steps
            .iter()
            .map(|s| match s {
                Step::Literal(l) => l.as_str(),
                Step::Param { value, .. } => value.as_str(),
            })
            .collect();
        format!("/{}", parts.join("/"))
    }
}
