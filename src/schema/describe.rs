//! Static type rendering and Rust type to schema mapping.

use serde_json::Value;

use crate::schema::types::Schema;

/// Render a schema as a TypeScript-flavoured type expression.
///
/// `{ firstName: string; age?: integer }`, `string[]`, `(integer | null)[]`.
pub fn describe(schema: &Schema) -> String {
    match schema {
        Schema::Any => "unknown".to_string(),
        Schema::Null => "null".to_string(),
        Schema::Bool => "boolean".to_string(),
        Schema::Integer => "integer".to_string(),
        Schema::Number => "number".to_string(),
        Schema::String => "string".to_string(),
        Schema::Array { items } => match items.as_ref() {
            Schema::Nullable { .. } => format!("({})[]", describe(items)),
            _ => format!("{}[]", describe(items)),
        },
        Schema::Nullable { inner } => format!("{} | null", describe(inner)),
        Schema::Object(object) => {
            if object.fields.is_empty() {
                return "{}".to_string();
            }
            let members: Vec<String> = object
                .fields
                .iter()
                .map(|f| {
                    let marker = if f.required { "" } else { "?" };
                    format!("{}{}: {}", f.name, marker, describe(&f.schema))
                })
                .collect();
            format!("{{ {} }}", members.join("; "))
        }
    }
}

/// Rust types with a known wire schema.
///
/// Implemented for primitives and containers here; request and response
/// structs implement it by hand next to their serde derives.
pub trait Describe {
    fn schema() -> Schema;
}

macro_rules! describe_as {
    ($schema:expr => $($ty:ty),+) => {
        $(
            impl Describe for $ty {
                fn schema() -> Schema {
                    $schema
                }
            }
        )+
    };
}

describe_as!(Schema::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
describe_as!(Schema::Number => f32, f64);
describe_as!(Schema::String => String, char);
describe_as!(Schema::Bool => bool);
describe_as!(Schema::Null => ());
describe_as!(Schema::Any => Value);

impl<T: Describe> Describe for Vec<T> {
    fn schema() -> Schema {
        Schema::array(T::schema())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn schema() -> Schema {
        Schema::nullable(T::schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_object() {
        let schema: Schema = Schema::object()
            .required("firstName", Schema::string())
            .optional("age", Schema::integer())
            .required("tags", Schema::array(Schema::nullable(Schema::string())))
            .into();
        assert_eq!(
            describe(&schema),
            "{ firstName: string; age?: integer; tags: (string | null)[] }"
        );
        assert_eq!(describe(&Schema::object().into()), "{}");
    }

    #[test]
    fn test_rust_types() {
        assert_eq!(<Vec<u64>>::schema(), Schema::array(Schema::integer()));
        assert_eq!(<Option<String>>::schema(), Schema::nullable(Schema::string()));
        assert_eq!(<()>::schema(), Schema::Null);
        assert_eq!(describe(&<Vec<Option<bool>>>::schema()), "(boolean | null)[]");
    }
}
