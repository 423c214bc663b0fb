//! Typed field values held by the shared store.

use pelorus::Location;

/// A single stored field.
///
/// Timestamps are fractional seconds since the Unix epoch. Composite
/// record fields (locations, arrays) are flattened into several `Value`s
/// by their codecs rather than nested here.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(f64),
    Str(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) | Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Current wall clock as a store timestamp.
pub fn now_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Flatten a location into its stored components.
pub fn location_fields(loc: &Location) -> [(&'static str, Value); 2] {
    [
        ("latitude", Value::Float(loc.latitude)),
        ("longitude", Value::Float(loc.longitude)),
    ]
}
