//! Immutable record type
//!
//! A record is a tuple of named, typed fields. Fields never change after
//! construction; updating a field means erasing the record from the
//! container and inserting a replacement.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::field::FieldValue;

/// Result type for record construction
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors raised while building a record from external input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Only JSON objects map onto records
    #[error("record must be built from a JSON object")]
    NotAnObject,

    /// Arrays, nested objects and nulls have no field representation
    #[error("field '{0}' holds a value that cannot be stored in a record")]
    UnsupportedField(String),
}

/// An immutable tuple of named, typed fields.
///
/// Field names are ordered deterministically (BTreeMap iteration order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Start building a record
    pub fn builder() -> RecordBuilder {
        RecordBuilder {
            fields: BTreeMap::new(),
        }
    }

    /// Build a record from a JSON object with scalar fields.
    ///
    /// Rejects non-object input and any field holding an array, object
    /// or null.
    pub fn from_json(value: &serde_json::Value) -> RecordResult<Self> {
        let map = value.as_object().ok_or(RecordError::NotAnObject)?;

        let mut fields = BTreeMap::new();
        for (name, raw) in map {
            let field = FieldValue::from_json(raw)
                .ok_or_else(|| RecordError::UnsupportedField(name.clone()))?;
            fields.insert(name.clone(), field);
        }

        Ok(Self { fields })
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether the record carries the named field
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Iterate fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Builder for [`Record`]
///
/// Later fields with the same name overwrite earlier ones.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: BTreeMap<String, FieldValue>,
}

impl RecordBuilder {
    /// Set a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Finish the record
    pub fn build(self) -> Record {
        Record {
            fields: self.fields,
        }
    }
}
