//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assigned or propagated)
//!     → server.rs dispatch_handler (HTTP request → RpcRequest)
//!     → Dispatcher (match, validate, invoke, encode)
//!     → RpcResponse → HTTP response
//! ```

pub mod request;
pub mod server;

pub use request::{request_id_middleware, X_REQUEST_ID};
pub use server::{AppState, RpcServer, MANIFEST_PATH};
