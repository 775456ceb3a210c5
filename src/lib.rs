//! Typed RPC boundary over HTTP.
//!
//! Routes are declared once in a [`RouteTable`]; a [`Dispatcher`] serves
//! them with input and output validation, and a [`ClientProxy`] calls them
//! from the other side using the same route shape.

pub mod app;
pub mod client;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod schema;

pub use client::{ClientError, ClientProxy};
pub use config::RpcConfig;
pub use dispatch::{Dispatcher, HandlerError, HandlerInput, RpcRequest, RpcResponse};
pub use http::RpcServer;
pub use lifecycle::Shutdown;
pub use routing::{Endpoint, Method, RouteSpec, RouteTable};
pub use schema::{Describe, Schema};
