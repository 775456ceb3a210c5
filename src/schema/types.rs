//! Schema model.

use serde::{Deserialize, Serialize};

/// Expected shape of a JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schema {
    /// Any value is accepted.
    Any,
    Null,
    #[serde(rename = "boolean")]
    Bool,
    /// Whole number (JSON numbers with no fractional part).
    Integer,
    Number,
    String,
    Array {
        items: Box<Schema>,
    },
    Object(ObjectSchema),
    /// The inner schema, or null.
    Nullable {
        inner: Box<Schema>,
    },
}

impl Schema {
    pub fn any() -> Self {
        Schema::Any
    }

    pub fn null() -> Self {
        Schema::Null
    }

    pub fn boolean() -> Self {
        Schema::Bool
    }

    pub fn integer() -> Self {
        Schema::Integer
    }

    pub fn number() -> Self {
        Schema::Number
    }

    pub fn string() -> Self {
        Schema::String
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    pub fn nullable(inner: Schema) -> Self {
        Schema::Nullable {
            inner: Box::new(inner),
        }
    }

    /// Start an object schema. Fields are added with [`ObjectSchema::required`]
    /// and [`ObjectSchema::optional`].
    pub fn object() -> ObjectSchema {
        ObjectSchema::default()
    }

    /// Object field lookup, `None` for non-object schemas.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Schema::Object(object) => object.field(name),
            _ => None,
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }
}

/// Object shape: named fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    pub fields: Vec<Field>,

    /// Reject fields not listed in `fields`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strict: bool,
}

impl ObjectSchema {
    pub fn required(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            schema: schema.into(),
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            schema: schema.into(),
            required: false,
        });
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named object member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}
