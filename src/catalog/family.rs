use serde_json::Value;

use crate::resources::{Field, ResourceRecord};

use super::expectation::Expectation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    List,
}

#[derive(Debug, Clone, Copy)]
pub struct RequiredField {
    /// Wire name.
    pub name: &'static str,
    pub kind: FieldKind,
}

impl RequiredField {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn number(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Number,
        }
    }

    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::List,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProbeValue {
    /// Set through the record, so it must fit the field type.
    Field(Field<Value>),
    /// Written straight into the JSON tree and sent as a raw body. Used for
    /// values a typed record cannot hold, such as non-finite numbers.
    Untyped(Value),
}

impl ProbeValue {
    pub fn value(value: impl Into<Value>) -> Self {
        ProbeValue::Field(Field::Value(value.into()))
    }

    pub fn null() -> Self {
        ProbeValue::Field(Field::Null)
    }

    pub fn untyped(value: impl Into<Value>) -> Self {
        ProbeValue::Untyped(value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    Create,
    Update(i64),
}

/// A family-specific list of values tried in one field of the template
/// record.
#[derive(Debug, Clone)]
pub struct FieldProbe {
    pub name: &'static str,
    pub field: &'static str,
    pub values: Vec<ProbeValue>,
    pub tags: Vec<&'static str>,
    pub target: ProbeTarget,
    pub expectation: Expectation,
}

impl FieldProbe {
    pub fn new(name: &'static str, field: &'static str, expectation: Expectation) -> Self {
        Self {
            name,
            field,
            values: Vec::new(),
            tags: Vec::new(),
            target: ProbeTarget::Create,
            expectation,
        }
    }

    pub fn values(mut self, values: impl IntoIterator<Item = ProbeValue>) -> Self {
        self.values.extend(values);
        self
    }

    pub fn tags(mut self, tags: &[&'static str]) -> Self {
        self.tags.extend_from_slice(tags);
        self
    }

    pub fn on_update(mut self, id: i64) -> Self {
        self.target = ProbeTarget::Update(id);
        self
    }
}

/// Everything the CRUD catalog needs to know about one resource collection.
#[derive(Debug, Clone)]
pub struct ResourceFamily {
    pub name: &'static str,
    pub endpoint: String,
    /// Table name used in SQL injection payloads.
    pub table: &'static str,
    pub sql_columns: &'static str,
    /// Text field that receives XSS and long-string payloads.
    pub primary_text_field: &'static str,
    /// Valid record that field probes mutate.
    pub template: ResourceRecord,
    pub valid_records: Vec<ResourceRecord>,
    pub update_records: Vec<(i64, ResourceRecord)>,
    pub required_fields: Vec<RequiredField>,
    pub valid_ids: Vec<i64>,
    pub invalid_ids: Vec<i64>,
    pub boundary_ids: Vec<i64>,
    pub malformed_bodies: Vec<&'static str>,
    pub partial_updates: Vec<(i64, &'static str)>,
    /// Expectation for creates that should be rejected.
    pub create_rejection: Expectation,
    pub probes: Vec<FieldProbe>,
}

impl ResourceFamily {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn item_endpoint(&self) -> String {
        format!("{}/{{id}}", self.endpoint.trim_end_matches('/'))
    }
}
