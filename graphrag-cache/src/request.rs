//! Read-only view over an inbound query request
//!
//! Requests arrive from the query-optimization pipeline as JSON objects. The
//! optimizer only cares about a handful of optional fields:
//!
//! | key              | shape            |
//! |------------------|------------------|
//! | `type`           | string           |
//! | `entity_source`  | string           |
//! | `entity_sources` | array of strings |
//! | `query`          | string           |
//! | `entity_ids`     | array of strings |
//!
//! [`QueryRequest`] borrows the underlying map and exposes each recognized field
//! as a [`Field`], so a field that exists with the wrong shape is distinguishable
//! from one that is missing. Unknown keys are left alone; they only matter to the
//! fingerprint.

use crate::error::{OptimizerError, Result};
use serde_json::{Map, Value};

pub const TYPE_FIELD: &str = "type";
pub const ENTITY_SOURCE_FIELD: &str = "entity_source";
pub const ENTITY_SOURCES_FIELD: &str = "entity_sources";
pub const QUERY_FIELD: &str = "query";
pub const ENTITY_IDS_FIELD: &str = "entity_ids";

/// State of one recognized request field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<T> {
    /// Key missing or `null`
    Absent,

    /// Key present with the expected shape
    Present(T),

    /// Key present with some other shape
    Malformed { expected: &'static str },
}

impl<T> Field<T> {
    /// The value if present; malformed fields read as absent
    pub fn present(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Field::Malformed { .. })
    }

    /// Like [`Field::present`], but a malformed field is an error
    pub fn require_well_formed(self, field: &'static str) -> Result<Option<T>> {
        match self {
            Field::Absent => Ok(None),
            Field::Present(value) => Ok(Some(value)),
            Field::Malformed { expected } => Err(OptimizerError::MalformedField { field, expected }),
        }
    }
}

/// Name of a JSON value's kind, for diagnostics
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Borrowed view over a request object
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> QueryRequest<'a> {
    /// Wrap a JSON value; anything other than an object is rejected
    pub fn from_value(value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self::from_map(fields)),
            other => Err(OptimizerError::InvalidRequest {
                expected: "object",
                found: json_kind(other),
            }),
        }
    }

    /// Wrap a map that is already known to be an object
    pub fn from_map(fields: &'a Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The full underlying map, including unrecognized keys
    pub fn fields(&self) -> &'a Map<String, Value> {
        self.fields
    }

    pub fn type_tag(&self) -> Field<&'a str> {
        self.string_field(TYPE_FIELD)
    }

    pub fn entity_source(&self) -> Field<&'a str> {
        self.string_field(ENTITY_SOURCE_FIELD)
    }

    pub fn entity_sources(&self) -> Field<&'a [Value]> {
        self.list_field(ENTITY_SOURCES_FIELD)
    }

    pub fn query(&self) -> Field<&'a str> {
        self.string_field(QUERY_FIELD)
    }

    pub fn entity_ids(&self) -> Field<&'a [Value]> {
        self.list_field(ENTITY_IDS_FIELD)
    }

    fn string_field(&self, name: &str) -> Field<&'a str> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Field::Absent,
            Some(Value::String(s)) => Field::Present(s.as_str()),
            Some(_) => Field::Malformed { expected: "string" },
        }
    }

    fn list_field(&self, name: &str) -> Field<&'a [Value]> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Field::Absent,
            Some(Value::Array(items)) => Field::Present(items.as_slice()),
            Some(_) => Field::Malformed { expected: "array" },
        }
    }
}

/// String elements among the first `limit` items of a list; other kinds are skipped
pub fn leading_strings<'a>(items: &'a [Value], limit: usize) -> impl Iterator<Item = &'a str> + 'a {
    items.iter().take(limit).filter_map(Value::as_str)
}
