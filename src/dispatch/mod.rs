//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RpcRequest (method, path, query, body)
//!     → RouteTable::find (404 on no match)
//!     → codec decode + input schema validation (400, handler never runs)
//!     → handler.rs (validated input + path params)
//!     → output schema validation (500 contract mismatch, body never sent)
//!     → codec encode
//!     → RpcResponse (status, headers, body)
//! ```
//!
//! # Design Decisions
//! - Stateless: the only shared state is the immutable RouteTable
//! - Every failure becomes a well-formed response; nothing escapes
//! - Handler panics are caught and reported as 500
//! - Failures carry their kind in the `x-rpc-error` header

pub mod dispatcher;
pub mod handler;

pub use dispatcher::{DispatchError, Dispatcher, RpcRequest, RpcResponse, X_RPC_ERROR};
pub use handler::{handler, BoxedHandler, HandlerError, HandlerInput, HandlerResult};
