//! # Resource Records
//!
//! Plain data models for the entities served by the API under test: users,
//! products, carts and login credentials. Records carry fields only; they
//! know how to become a JSON tree and nothing else.
//!
//! Every field is a [`Field`], which keeps "sent as `null`" and "not sent at
//! all" apart. Catalogs rely on that to enumerate both variants of a missing
//! value.

mod field;

pub use field::Field;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record kind `{kind}` has no field `{field}`")]
    UnknownField { kind: &'static str, field: String },
    #[error("value for `{kind}.{field}` does not fit the field type: {source}")]
    InvalidValue {
        kind: &'static str,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize `{kind}` record: {source}")]
    Serialize {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub username: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub email: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub password: Field<String>,
}

impl User {
    pub const FIELDS: &'static [&'static str] = &["id", "username", "email", "password"];

    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            id: Field::Absent,
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id: Field::Value(id),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub price: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub category: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub image: Field<String>,
}

impl Product {
    pub const FIELDS: &'static [&'static str] =
        &["id", "title", "price", "description", "category", "image"];

    pub fn new(title: &str, price: f64, description: &str, category: &str, image: &str) -> Self {
        Self {
            id: Field::Absent,
            title: title.into(),
            price: Field::Value(price),
            description: description.into(),
            category: category.into(),
            image: image.into(),
        }
    }

    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id: Field::Value(id),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub product_id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub quantity: Field<i64>,
}

impl CartItem {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self {
            product_id: Field::Value(product_id),
            quantity: Field::Value(quantity),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub user_id: Field<i64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub products: Field<Vec<CartItem>>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub date: Field<String>,
}

impl Cart {
    pub const FIELDS: &'static [&'static str] = &["id", "userId", "products", "date"];

    pub fn new(user_id: i64, products: Vec<CartItem>, date: &str) -> Self {
        Self {
            id: Field::Absent,
            user_id: Field::Value(user_id),
            products: Field::Value(products),
            date: date.into(),
        }
    }

    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id: Field::Value(id),
            ..self.clone()
        }
    }
}

/// Login request body.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub username: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub password: Field<String>,
}

impl Credentials {
    pub const FIELDS: &'static [&'static str] = &["username", "password"];

    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Any record a case can send as its request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum ResourceRecord {
    User(User),
    Product(Product),
    Cart(Cart),
    Credentials(Credentials),
}

impl ResourceRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceRecord::User(_) => "user",
            ResourceRecord::Product(_) => "product",
            ResourceRecord::Cart(_) => "cart",
            ResourceRecord::Credentials(_) => "credentials",
        }
    }

    fn field_names(&self) -> &'static [&'static str] {
        match self {
            ResourceRecord::User(_) => User::FIELDS,
            ResourceRecord::Product(_) => Product::FIELDS,
            ResourceRecord::Cart(_) => Cart::FIELDS,
            ResourceRecord::Credentials(_) => Credentials::FIELDS,
        }
    }

    /// JSON tree of the record as it goes on the wire. Absent fields are
    /// omitted, null fields are present with a `null` value.
    pub fn to_json(&self) -> Result<Value, RecordError> {
        let result = match self {
            ResourceRecord::User(user) => serde_json::to_value(user),
            ResourceRecord::Product(product) => serde_json::to_value(product),
            ResourceRecord::Cart(cart) => serde_json::to_value(cart),
            ResourceRecord::Credentials(credentials) => serde_json::to_value(credentials),
        };
        result.map_err(|source| RecordError::Serialize {
            kind: self.kind(),
            source,
        })
    }

    pub fn to_body(&self) -> Result<String, RecordError> {
        let tree = self.to_json()?;
        serde_json::to_string(&tree).map_err(|source| RecordError::Serialize {
            kind: self.kind(),
            source,
        })
    }

    /// Returns a copy of this record with one wire field replaced.
    pub fn with_field(&self, name: &str, value: Field<Value>) -> Result<Self, RecordError> {
        if !self.field_names().contains(&name) {
            return Err(RecordError::UnknownField {
                kind: self.kind(),
                field: name.to_string(),
            });
        }

        let mut tree = match self.to_json()? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        match value {
            Field::Absent => {
                tree.remove(name);
            }
            Field::Null => {
                tree.insert(name.to_string(), Value::Null);
            }
            Field::Value(value) => {
                tree.insert(name.to_string(), value);
            }
        }

        self.rebuild(Value::Object(tree))
            .map_err(|source| RecordError::InvalidValue {
                kind: self.kind(),
                field: name.to_string(),
                source,
            })
    }

    fn rebuild(&self, tree: Value) -> Result<Self, serde_json::Error> {
        match self {
            ResourceRecord::User(_) => serde_json::from_value(tree).map(ResourceRecord::User),
            ResourceRecord::Product(_) => serde_json::from_value(tree).map(ResourceRecord::Product),
            ResourceRecord::Cart(_) => serde_json::from_value(tree).map(ResourceRecord::Cart),
            ResourceRecord::Credentials(_) => {
                serde_json::from_value(tree).map(ResourceRecord::Credentials)
            }
        }
    }
}

impl From<User> for ResourceRecord {
    fn from(user: User) -> Self {
        ResourceRecord::User(user)
    }
}

impl From<Product> for ResourceRecord {
    fn from(product: Product) -> Self {
        ResourceRecord::Product(product)
    }
}

impl From<Cart> for ResourceRecord {
    fn from(cart: Cart) -> Self {
        ResourceRecord::Cart(cart)
    }
}

impl From<Credentials> for ResourceRecord {
    fn from(credentials: Credentials) -> Self {
        ResourceRecord::Credentials(credentials)
    }
}
