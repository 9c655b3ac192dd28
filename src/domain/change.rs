//! Proposed field values submitted with a create or update request

use super::common::ObjectId;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A mapping from field name to proposed new value.
///
/// A field absent from the mapping is treated as unchanged. Reference-valued
/// fields carry a UUID string or null; anything else fails validation when
/// the field is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeRequest(Map<String, Value>);

impl ChangeRequest {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build from any JSON value; non-objects are rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AppError::Validation(format!(
                "expected an object payload, got {other}"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Set a reference field to an id or an explicit null.
    pub fn insert_reference(&mut self, field: impl Into<String>, id: Option<ObjectId>) {
        let value = match id {
            Some(id) => Value::String(id.to_string()),
            None => Value::Null,
        };
        self.0.insert(field.into(), value);
    }

    /// Read a reference-valued field.
    ///
    /// Returns `Ok(None)` when the field is absent or explicitly null, the id
    /// when it parses, and a validation error for any other shape. Callers in
    /// the permission path convert that error into a denial.
    pub fn reference(&self, field: &str) -> Result<Option<ObjectId>> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => Ok(Some(ObjectId::parse_str(raw)?)),
            Some(other) => Err(AppError::Validation(format!(
                "field '{field}' must be an id string or null, got {other}"
            ))),
        }
    }

    /// Read a plain string field, if present.
    pub fn string_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ChangeRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
