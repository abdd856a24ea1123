//! Typed field values with deterministic total ordering
//!
//! Every indexable value is one of four scalar kinds. Ordering is
//! deterministic across kinds: Bool < Int < Float < String.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar field value as stored in a record and projected into indexes.
///
/// Supports String, Int (i64), Float (f64 bits for ordering), Bool.
/// Ordering is deterministic: Bool < Int < Float < String.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    String(String),
}

impl FieldValue {
    /// Create a value from a boolean
    pub fn from_bool(v: bool) -> Self {
        FieldValue::Bool(v)
    }

    /// Create a value from an integer
    pub fn from_int(v: i64) -> Self {
        FieldValue::Int(v)
    }

    /// Create a value from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        // Negative floats: flip all bits. Positive floats: flip sign bit.
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        FieldValue::Float(ordered)
    }

    /// Create a value from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        FieldValue::String(v.into())
    }

    /// Create a value from a JSON scalar
    ///
    /// Arrays, objects and null are not representable.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(FieldValue::from_bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(FieldValue::from_int(i))
                } else {
                    n.as_f64().map(FieldValue::from_float)
                }
            }
            serde_json::Value::String(s) => Some(FieldValue::from_string(s)),
            _ => None,
        }
    }

    /// Recover the numeric float from the ordered bit representation
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(bits) => {
                let raw = if (bits >> 63) == 1 {
                    bits ^ (1 << 63)
                } else {
                    !bits
                };
                Some(f64::from_bits(raw))
            }
            _ => None,
        }
    }

    /// Returns the kind name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(_) => match self.as_f64() {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "float"),
            },
            FieldValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::from_bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::from_int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::from_float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::from_string(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}
