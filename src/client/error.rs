//! Client-side failure taxonomy.
//!
//! Callers branch on the variant: a transport failure is never reported as
//! a contract mismatch, and neither is confused with an error response the
//! server chose to send.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::codec::CodecError;
use crate::routing::RouteError;
use crate::schema::ValidationError;

/// The call never produced a complete response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, timeout, reset, unreadable body.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The caller's abort signal fired first; the connection was dropped.
    #[error("request aborted")]
    Aborted,
}

/// A 2xx response that does not fit the route's declared output.
#[derive(Debug, Error)]
pub enum ContractMismatch {
    #[error("response body could not be decoded: {0}")]
    Undecodable(CodecError),

    #[error("response violates the output schema: {0}")]
    Schema(ValidationError),

    #[error("response does not deserialize into the output type: {0}")]
    Typed(serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("contract mismatch: {0}")]
    ContractMismatch(#[from] ContractMismatch),

    /// Non-2xx response: a handler's domain error, or a validation,
    /// not-found or contract failure reported by the server. `kind` is the
    /// server's `x-rpc-error` header when present.
    #[error("server responded {status}: {payload}")]
    Status {
        status: StatusCode,
        kind: Option<String>,
        payload: Value,
    },

    /// The proxy's route shape has no such member or method.
    #[error("no such route: {0}")]
    UnknownRoute(String),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("cannot encode call input: {0}")]
    Codec(#[from] CodecError),

    #[error("cannot serialize call arguments: {0}")]
    Arguments(#[from] serde_json::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport(TransportError::Aborted) => "aborted",
            ClientError::Transport(_) => "transport",
            ClientError::ContractMismatch(_) => "contract_mismatch",
            ClientError::Status { .. } => "status",
            ClientError::UnknownRoute(_) => "unknown_route",
            ClientError::Route(_) | ClientError::Codec(_) | ClientError::Arguments(_) => "arguments",
            ClientError::InvalidBaseUrl { .. } => "invalid_base_url",
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_contract_mismatch(&self) -> bool {
        matches!(self, ClientError::ContractMismatch(_))
    }

    /// HTTP status of an error response, if that is what this is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
