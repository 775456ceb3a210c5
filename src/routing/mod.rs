//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     register(method, pattern, schemas, handler)
//!     → pattern.rs (parse segments, reject duplicate parameter names)
//!     → table.rs (reject duplicate method + pattern, accumulate errors)
//!     → build() freezes an immutable RouteTable
//!
//! Shape export:
//!     RouteTable → manifest.rs (RouteManifest) → client proxy
//!
//! Incoming request (method, path):
//!     → table.rs find() scans routes in registration order
//!     → Return: matched route + bound PathParams, or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - First match wins (registration order)
//! - Duplicate method + pattern is rejected at build time, never overwritten
//! - All registration problems are reported together by build()

pub mod endpoint;
pub mod manifest;
pub mod method;
pub mod pattern;
pub mod table;

use thiserror::Error;

pub use endpoint::Endpoint;
pub use manifest::{RouteManifest, RouteShape};
pub use method::Method;
pub use pattern::{PathParams, PathPattern, Segment};
pub use table::{RouteDefinition, RouteSpec, RouteTable, RouteTableBuilder};

/// Registration-time problems with a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("parameter ':{name}' appears more than once in '{pattern}'")]
    DuplicateParam { pattern: String, name: String },

    /// The same method and pattern were registered twice.
    #[error("duplicate route {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },

    #[error("missing value for parameter ':{name}' of '{pattern}'")]
    MissingParam { pattern: String, name: String },

    #[error("unknown method '{0}'")]
    UnknownMethod(String),
}

/// `RouteTableBuilder::build` failed; lists every problem found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route table has {} error(s): {}", .errors.len(), join(.errors))]
pub struct BuildError {
    pub errors: Vec<RouteError>,
}

fn join(errors: &[RouteError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
