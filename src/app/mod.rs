//! Demo application routes.
//!
//! # Routes
//! ```text
//! GET|POST|PUT|PATCH|DELETE /methods/<verb>  → "<VERB> request"
//! GET  /hello1   ?firstName&lastName         → "Hello 1 <first> <last>"
//! POST /hello2   { firstName, lastName }     → "Hello 2 <first> <last>"
//! GET  /item/:id                             → Item (typed endpoint)
//! GET  /tags                                 → string[] (typed endpoint)
//! ```
//!
//! The same table backs the `typed-rpc` binary and the integration tests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dispatch::{HandlerError, HandlerInput};
use crate::routing::{Endpoint, Method, RouteSpec, RouteTable, RouteTableBuilder};
use crate::schema::{Describe, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Describe for Item {
    fn schema() -> Schema {
        Schema::object()
            .required("id", Schema::integer())
            .required("name", Schema::string())
            .optional("tags", Vec::<String>::schema())
            .into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemParams {
    pub id: u64,
}

/// `GET /item/:id`
pub struct GetItem;

impl Endpoint for GetItem {
    const METHOD: Method = Method::Get;
    const PATH: &'static str = "/item/:id";
    type Params = ItemParams;
    type Input = ();
    type Output = Item;
}

/// `GET /tags`
pub struct ListTags;

impl Endpoint for ListTags {
    const METHOD: Method = Method::Get;
    const PATH: &'static str = "/tags";
    type Params = ();
    type Input = ();
    type Output = Vec<String>;
}

fn catalogue() -> Vec<Item> {
    vec![
        Item {
            id: 1,
            name: "Analytical Engine".into(),
            tags: vec!["hardware".into(), "history".into()],
        },
        Item {
            id: 2,
            name: "Difference Engine".into(),
            tags: vec!["hardware".into()],
        },
        Item {
            id: 3,
            name: "Note G".into(),
            tags: vec!["software".into(), "history".into()],
        },
    ]
}

fn name_schema() -> Schema {
    Schema::object()
        .required("firstName", Schema::string())
        .required("lastName", Schema::string())
        .into()
}

fn greet(prefix: &str, input: &HandlerInput) -> Value {
    let first = input.str_field("firstName").unwrap_or_default();
    let last = input.str_field("lastName").unwrap_or_default();
    json!(format!("{} {} {}", prefix, first, last))
}

/// The `/methods/*` group: one route per verb, each echoing its verb.
pub fn methods_group() -> RouteTableBuilder {
    [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ]
    .into_iter()
    .fold(RouteTableBuilder::new(), |builder, method| {
        let path = format!("/{}", method.as_str().to_ascii_lowercase());
        let reply = format!("{} request", method);
        builder.route(
            method,
            &path,
            RouteSpec::new(move |_| {
                let reply = reply.clone();
                async move { Ok(json!(reply)) }
            })
            .output(Schema::string()),
        )
    })
}

/// Full demo route table, unbuilt so callers can add to it.
pub fn routes() -> RouteTableBuilder {
    RouteTable::builder()
        .merge("/methods", methods_group())
        .get(
            "/hello1",
            RouteSpec::new(|input: HandlerInput| async move { Ok(greet("Hello 1", &input)) })
                .input(name_schema())
                .output(Schema::string()),
        )
        .post(
            "/hello2",
            RouteSpec::new(|input: HandlerInput| async move { Ok(greet("Hello 2", &input)) })
                .input(name_schema())
                .output(Schema::string()),
        )
        .endpoint::<GetItem, _, _>(|params: ItemParams, ()| async move {
            catalogue()
                .into_iter()
                .find(|item| item.id == params.id)
                .ok_or_else(|| HandlerError::not_found(format!("no item with id {}", params.id)))
        })
        .endpoint::<ListTags, _, _>(|(), ()| async move {
            let mut tags: Vec<String> = catalogue().into_iter().flat_map(|i| i.tags).collect();
            tags.sort();
            tags.dedup();
            Ok(tags)
        })
}
