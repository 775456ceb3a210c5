//! Wire codec.
//!
//! # Data Flow
//! ```text
//! Query-carrying methods (GET, HEAD, DELETE, OPTIONS):
//!     client: input object → query.rs encode → ?a=1&b=x
//!     server: ?a=1&b=x → query.rs decode (coerced by schema) → input object
//!
//! Body-carrying methods (POST, PUT, PATCH):
//!     client: input → body.rs encode → JSON (or text for bare strings)
//!     server: body bytes + content type → body.rs decode → input
//!
//! Responses use body.rs in both directions.
//! ```
//!
//! # Design Decisions
//! - Bare string values travel as `text/plain`, everything else as JSON
//! - Query values are strings on the wire; the schema decides coercion
//! - Unparsable scalars stay strings so validation can report them

pub mod body;
pub mod query;

use thiserror::Error;

pub use body::{decode_body, encode_body, is_text, EncodedBody, APPLICATION_JSON, TEXT_PLAIN};
pub use query::{decode_query, encode_query};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("text body is not valid UTF-8")]
    InvalidUtf8,

    #[error("query input must be an object, got {0}")]
    QueryNotObject(&'static str),

    #[error("query field '{0}' holds a nested object")]
    NestedQueryValue(String),
}
