//! Client proxy subsystem.
//!
//! # Data Flow
//! ```text
//! RouteManifest (shared value, or fetched from /__manifest)
//!     → proxy.rs ClientProxy (parsed patterns + schemas, pooled HTTP client)
//!     → ProxyNode navigation: at("item") → param("id", 42)
//!     → terminal call: get(input) / post(input) / ...
//!         → codec encode (query or body)
//!         → HTTP request
//!         → codec decode + output schema check
//!     → Value, or a ClientError naming what went wrong
//!
//! Typed path (no manifest needed):
//!     Endpoint type → ClientProxy::endpoint::<E>(params, input) → E::Output
//! ```
//!
//! # Design Decisions
//! - Literal segments are members, parameter segments are call arguments
//! - No validation of input: the server owns that; only encoding happens here
//! - Output is checked against the declared schema; a mismatch is a distinct error
//! - A proxy is stateless beyond its base URL and connection pool; clones share the pool

pub mod error;
pub mod proxy;

pub use error::{ClientError, ContractMismatch, TransportError};
pub use proxy::{ClientProxy, ProxyNode};
