//! Route handlers.
//!
//! A handler is an async function from validated input plus bound path
//! parameters to an output value or a domain failure. Handlers are stored
//! type-erased so one table can hold routes of every shape.

use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::routing::PathParams;

/// What a handler returns.
pub type HandlerResult = Result<Value, HandlerError>;

/// Type-erased async handler.
pub type BoxedHandler = Arc<dyn Fn(HandlerInput) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wrap an async closure as a [`BoxedHandler`].
pub fn handler<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(HandlerInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |input| f(input).boxed())
}

/// Everything a handler receives for one request.
#[derive(Debug, Clone, Default)]
pub struct HandlerInput {
    /// Values bound from parameter segments of the path.
    pub params: PathParams,
    /// Decoded query or body. Already validated when the route declares an
    /// input schema; an object of query strings otherwise.
    pub input: Value,
}

impl HandlerInput {
    pub fn new(params: PathParams, input: Value) -> Self {
        Self { params, input }
    }

    /// A bound path parameter. Missing parameters can only happen when the
    /// handler asks for a name its pattern does not declare.
    pub fn param(&self, name: &str) -> Result<&str, HandlerError> {
        self.params
            .get(name)
            .ok_or_else(|| HandlerError::internal(format!("no path parameter named '{}'", name)))
    }

    /// A string member of the input object.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.input.get(name).and_then(Value::as_str)
    }

    /// Deserialize the input into a typed request struct.
    pub fn input_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.input.clone())
            .map_err(|e| HandlerError::bad_request(format!("input does not fit: {}", e)))
    }
}

/// A failure reported by a handler. Carries the status and payload that
/// are sent to the client as-is.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("handler failed with status {status}: {payload}")]
pub struct HandlerError {
    pub status: StatusCode,
    pub payload: Value,
}

impl HandlerError {
    pub fn new(status: StatusCode, payload: impl Into<Value>) -> Self {
        Self {
            status,
            payload: payload.into(),
        }
    }

    fn with_kind(status: StatusCode, kind: &str, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": kind, "message": message.into() }))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_kind(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_kind(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[tokio::test]
    async fn test_boxed_handler_runs() {
        let h = handler(|input: HandlerInput| async move {
            let id = input.param("id")?.to_string();
            Ok(json!({ "id": id }))
        });

        let input = HandlerInput::new(PathParams::new().with("id", "5"), Value::Null);
        assert_eq!(h(input).await.unwrap(), json!({ "id": "5" }));

        let err = h(HandlerInput::default()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_input_as() {
        #[derive(Debug, Deserialize)]
        struct Greeting {
            name: String,
        }

        let input = HandlerInput::new(PathParams::new(), json!({ "name": "Ada" }));
        assert_eq!(input.input_as::<Greeting>().unwrap().name, "Ada");
        assert_eq!(input.str_field("name"), Some("Ada"));

        let err = HandlerInput::default().input_as::<Greeting>().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.payload["error"], "bad_request");
    }
}
