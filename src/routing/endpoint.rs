//! Typed endpoints.
//!
//! An [`Endpoint`] names one route at the type level: its method, path
//! pattern, and the Rust types of its parameters, input and output. The
//! server registers it with `RouteTableBuilder::endpoint`, a client calls it
//! with `ClientProxy::endpoint`. Both sides derive schemas from the same
//! associated types, so a shared module of endpoint types is the whole
//! interface definition.
//!
//! ```rust,ignore
//! struct GetItem;
//!
//! impl Endpoint for GetItem {
//!     const METHOD: Method = Method::Get;
//!     const PATH: &'static str = "/item/:id";
//!     type Params = ItemParams;
//!     type Input = ();
//!     type Output = Item;
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::routing::Method;
use crate::schema::{Describe, Schema};

pub trait Endpoint: 'static {
    const METHOD: Method;
    const PATH: &'static str;

    /// Path parameters; `()` for patterns without any.
    type Params: Serialize + DeserializeOwned + Send + 'static;
    /// Query or body input; `()` for none.
    type Input: Describe + Serialize + DeserializeOwned + Send + 'static;
    type Output: Describe + Serialize + DeserializeOwned + Send + 'static;

    fn input_schema() -> Option<Schema> {
        declared(Self::Input::schema())
    }

    fn output_schema() -> Option<Schema> {
        declared(Self::Output::schema())
    }
}

/// `()` maps to the null schema, which means "nothing declared".
fn declared(schema: Schema) -> Option<Schema> {
    if schema == Schema::Null {
        None
    } else {
        Some(schema)
    }
}
