//! Value shape descriptions shared by both sides of the RPC boundary.
//!
//! # Data Flow
//! ```text
//! Route declaration
//!     → types.rs (Schema / ObjectSchema built by the route author)
//!     → validate.rs (inbound input, outbound output, client-side decode)
//!     → describe.rs (static type rendering for manifests and the CLI)
//! ```
//!
//! # Design Decisions
//! - Schemas are plain data: serializable so a manifest can carry them
//! - Validation works on `serde_json::Value`, never on typed structs
//! - Validation reports every failing field, not just the first
//! - Objects accept unknown fields unless marked strict

pub mod describe;
pub mod types;
pub mod validate;

pub use describe::{describe, Describe};
pub use types::{Field, ObjectSchema, Schema};
pub use validate::{validate, FieldIssue, ValidationError};
