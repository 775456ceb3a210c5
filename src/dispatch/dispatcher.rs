//! Route matching, validation and handler invocation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use serde_json::{json, Value};
use thiserror::Error;

use crate::codec::{
    decode_body, decode_query, encode_body, encode_query, is_text, CodecError, EncodedBody,
};
use crate::dispatch::handler::{HandlerError, HandlerInput};
use crate::observability::metrics;
use crate::routing::{Method, PathParams, RouteDefinition, RouteTable};
use crate::schema::{validate, ValidationError};

/// Response header naming the failure kind of an error response.
pub const X_RPC_ERROR: &str = "x-rpc-error";

/// Transport-neutral request.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RpcRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            content_type: None,
            body: Bytes::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_body(mut self, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.content_type = Some(content_type.into());
        self.body = body.into();
        self
    }

    /// Encode `input` where this method carries it: the body for
    /// POST/PUT/PATCH, the query string otherwise.
    pub fn with_input(self, input: &Value) -> Result<Self, CodecError> {
        if self.method.carries_body() {
            let EncodedBody {
                content_type,
                bytes,
            } = encode_body(input)?;
            Ok(self.with_body(content_type, bytes))
        } else {
            match encode_query(input)? {
                Some(query) => Ok(self.with_query(query)),
                None => Ok(self),
            }
        }
    }
}

/// Transport-neutral response.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RpcResponse {
    fn encoded(status: StatusCode, body: EncodedBody) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(body.content_type));
        Self {
            status,
            headers,
            body: Bytes::from(body.bytes),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Failure kind of an error response (`not_found`, `validation_failed`, ...).
    pub fn error_kind(&self) -> Option<&str> {
        self.headers.get(X_RPC_ERROR).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body the way the client proxy does.
    pub fn decode(&self) -> Result<Value, CodecError> {
        decode_body(self.content_type(), &self.body)
    }
}

impl IntoResponse for RpcResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Why a request did not produce a normal response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("invalid input: {0}")]
    Validation(ValidationError),

    #[error("undecodable input: {0}")]
    BadRequest(CodecError),

    #[error(transparent)]
    Handler(HandlerError),

    /// The handler returned a value its route's output schema rejects.
    #[error("handler output violates its declared schema: {0}")]
    ContractMismatch(ValidationError),

    #[error("output could not be encoded: {0}")]
    Encode(CodecError),

    #[error("handler panicked")]
    Panicked,
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Validation(_) | DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Handler(e) => e.status,
            DispatchError::ContractMismatch(_)
            | DispatchError::Encode(_)
            | DispatchError::Panicked => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::NotFound { .. } => "not_found",
            DispatchError::Validation(_) => "validation_failed",
            DispatchError::BadRequest(_) => "bad_request",
            DispatchError::Handler(_) => "handler_error",
            DispatchError::ContractMismatch(_) => "contract_mismatch",
            DispatchError::Encode(_) | DispatchError::Panicked => "internal_error",
        }
    }

    pub fn into_response(self) -> RpcResponse {
        let status = self.status();
        let kind = self.kind();

        let payload = match self {
            DispatchError::Handler(e) => e.payload,
            DispatchError::Validation(e) | DispatchError::ContractMismatch(e) => json!({
                "error": kind,
                "message": e.to_string(),
                "issues": e.issues,
            }),
            other => json!({ "error": kind, "message": other.to_string() }),
        };

        let body = encode_body(&payload).unwrap_or_else(|_| EncodedBody {
            content_type: crate::codec::TEXT_PLAIN,
            bytes: kind.as_bytes().to_vec(),
        });
        let mut response = RpcResponse::encoded(status, body);
        response
            .headers
            .insert(X_RPC_ERROR, HeaderValue::from_static(kind));
        response
    }
}

/// Serves requests against an immutable route table.
///
/// Cheap to clone; clones share the table. Concurrent `dispatch` calls are
/// independent.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
}

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Run one request to completion. Never fails: every error is turned
    /// into its response.
    pub async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let start = Instant::now();

        let (route_label, result) = match self.table.find(request.method, &request.path) {
            Some((route, params)) => (
                route.pattern.as_str(),
                invoke(route, params, &request).await,
            ),
            None => (
                "none",
                Err(DispatchError::NotFound {
                    method: request.method,
                    path: request.path.clone(),
                }),
            ),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    DispatchError::ContractMismatch(_)
                    | DispatchError::Encode(_)
                    | DispatchError::Panicked => tracing::error!(
                        method = %request.method,
                        path = %request.path,
                        route = route_label,
                        error = %e,
                        "Dispatch failed"
                    ),
                    _ => tracing::debug!(
                        method = %request.method,
                        path = %request.path,
                        route = route_label,
                        error = %e,
                        "Request rejected"
                    ),
                }
                e.into_response()
            }
        };

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            route = route_label,
            status = response.status.as_u16(),
            "Request dispatched"
        );
        metrics::record_request(
            request.method.as_str(),
            route_label,
            response.status.as_u16(),
            start,
        );
        response
    }
}

async fn invoke(
    route: &RouteDefinition,
    params: PathParams,
    request: &RpcRequest,
) -> Result<RpcResponse, DispatchError> {
    let input = decode_input(route, request)?;
    if let Some(schema) = &route.input_schema {
        validate(&input, schema).map_err(DispatchError::Validation)?;
    }

    let call = (route.handler())(HandlerInput::new(params, input));
    let output = AssertUnwindSafe(call)
        .catch_unwind()
        .await
        .map_err(|_| DispatchError::Panicked)?
        .map_err(DispatchError::Handler)?;

    if let Some(schema) = &route.output_schema {
        validate(&output, schema).map_err(DispatchError::ContractMismatch)?;
    }

    let body = encode_body(&output).map_err(DispatchError::Encode)?;
    Ok(RpcResponse::encoded(StatusCode::OK, body))
}

/// Body for body-carrying methods when one was sent, the query otherwise.
/// An empty `text/*` body is the empty string, not a missing body.
fn decode_input(route: &RouteDefinition, request: &RpcRequest) -> Result<Value, DispatchError> {
    let content_type = request.content_type.as_deref();
    let has_body = !request.body.is_empty() || is_text(content_type);
    if request.method.carries_body() && has_body {
        decode_body(content_type, &request.body)
            .map_err(DispatchError::BadRequest)
    } else {
        Ok(decode_query(
            request.query.as_deref(),
            route.input_schema.as_ref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteSpec;
    use crate::schema::Schema;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dispatcher(builder: crate::routing::RouteTableBuilder) -> Dispatcher {
        Dispatcher::new(builder.build().unwrap())
    }

    #[tokio::test]
    async fn test_plain_text_response() {
        let d = dispatcher(RouteTable::builder().get(
            "/methods/get",
            RouteSpec::new(|_| async { Ok(json!("GET request")) }),
        ));

        let response = d.dispatch(RpcRequest::new(Method::Get, "/methods/get")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text(), "GET request");
        assert_eq!(response.content_type(), Some(crate::codec::TEXT_PLAIN));
        assert!(response.error_kind().is_none());
    }

    #[tokio::test]
    async fn test_not_found() {
        let d = dispatcher(RouteTable::builder().get(
            "/methods/get",
            RouteSpec::new(|_| async { Ok(Value::Null) }),
        ));

        let response = d.dispatch(RpcRequest::new(Method::Post, "/methods/get")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error_kind(), Some("not_found"));
        assert_eq!(response.decode().unwrap()["error"], "not_found");
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let d = dispatcher(RouteTable::builder().post(
            "/items",
            RouteSpec::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(Value::Null) }
            })
            .input(Schema::object().required("name", Schema::string())),
        ));

        let request = RpcRequest::new(Method::Post, "/items")
            .with_input(&json!({ "name": 5 }))
            .unwrap();
        let response = d.dispatch(request).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_kind(), Some("validation_failed"));
        assert_eq!(response.decode().unwrap()["issues"][0]["path"], "/name");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let d = dispatcher(RouteTable::builder().post(
            "/items",
            RouteSpec::new(|_| async { Ok(Value::Null) }),
        ));

        let request = RpcRequest::new(Method::Post, "/items")
            .with_body(crate::codec::APPLICATION_JSON, "{oops");
        let response = d.dispatch(request).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_kind(), Some("bad_request"));
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let d = dispatcher(RouteTable::builder().get(
            "/item/:id",
            RouteSpec::new(|input: HandlerInput| async move {
                Err(HandlerError::not_found(format!("no item {}", input.param("id")?)))
            }),
        ));

        let response = d.dispatch(RpcRequest::new(Method::Get, "/item/3")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error_kind(), Some("handler_error"));
        assert_eq!(
            response.decode().unwrap(),
            json!({ "error": "not_found", "message": "no item 3" })
        );
    }

    #[tokio::test]
    async fn test_handler_panic_is_500() {
        let d = dispatcher(RouteTable::builder().get(
            "/boom",
            RouteSpec::new(|_| async {
                if true {
                    panic!("handler bug");
                }
                Ok(Value::Null)
            }),
        ));

        let response = d.dispatch(RpcRequest::new(Method::Get, "/boom")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error_kind(), Some("internal_error"));
    }

    #[tokio::test]
    async fn test_output_contract_violation() {
        let d = dispatcher(RouteTable::builder().get(
            "/item/:id",
            RouteSpec::new(|_| async { Ok(json!({ "id": 1 })) }).output(
                Schema::object()
                    .required("id", Schema::integer())
                    .required("name", Schema::string()),
            ),
        ));

        let response = d.dispatch(RpcRequest::new(Method::Get, "/item/1")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error_kind(), Some("contract_mismatch"));
        let body = response.decode().unwrap();
        assert_eq!(body["issues"][0]["path"], "/name");
        assert!(body.get("id").is_none());
    }

    #[tokio::test]
    async fn test_body_method_falls_back_to_query() {
        let d = dispatcher(RouteTable::builder().post(
            "/echo",
            RouteSpec::new(|input: HandlerInput| async move { Ok(input.input) }),
        ));

        let response = d
            .dispatch(RpcRequest::new(Method::Post, "/echo").with_query("a=1"))
            .await;
        assert_eq!(response.decode().unwrap(), json!({ "a": "1" }));
    }

    #[tokio::test]
    async fn test_empty_text_body_is_empty_string() {
        let d = dispatcher(RouteTable::builder().post(
            "/echo",
            RouteSpec::new(|input: HandlerInput| async move { Ok(input.input) })
                .input(Schema::string()),
        ));

        let request = RpcRequest::new(Method::Post, "/echo")
            .with_input(&json!(""))
            .unwrap();
        let response = d.dispatch(request).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.decode().unwrap(), json!(""));

        // no body and no content type still reads the query
        let response = d
            .dispatch(RpcRequest::new(Method::Post, "/echo").with_query("a=1"))
            .await;
        assert_eq!(response.error_kind(), Some("validation_failed"));
    }
}
