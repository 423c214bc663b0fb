//! Record schemas and their hand-written codecs.
//!
//! Each record type persisted in the store implements [`Record`]: a flat
//! keyspace prefix plus `pack`/`unpack` over the flattening rules. Scalar
//! fields live under `<name>.<field>`, arrays under `<name>.<field>1` ..
//! `<name>.<field>N` and locations under `<name>.<field>.latitude` /
//! `.longitude`.

use std::collections::HashMap;

use pelorus::Location;

use super::value::Value;

/// A typed record with a flat field layout in the store.
///
/// `Default` supplies the values reported for fields that were never
/// written.
pub trait Record: Default + Clone + Send + 'static {
    /// Keyspace prefix; also the publish/subscribe channel key.
    const NAME: &'static str;

    fn pack(&self, fields: &mut FieldWriter<'_>);

    fn unpack(fields: &FieldReader<'_>) -> Self;
}

/// Writes the flattened fields of one record.
pub struct FieldWriter<'a> {
    prefix: &'static str,
    map: &'a mut HashMap<String, Value>,
}

impl<'a> FieldWriter<'a> {
    pub(super) fn new(prefix: &'static str, map: &'a mut HashMap<String, Value>) -> Self {
        FieldWriter { prefix, map }
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.map
            .insert(format!("{}.{}", self.prefix, field), value);
    }

    pub fn set_location(&mut self, field: &str, location: &Location) {
        for (part, value) in super::value::location_fields(location) {
            self.map
                .insert(format!("{}.{}.{}", self.prefix, field, part), value);
        }
    }

    pub fn set_array<I>(&mut self, field: &str, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        for (i, value) in values.into_iter().enumerate() {
            self.map
                .insert(format!("{}.{}{}", self.prefix, field, i + 1), value);
        }
    }
}

/// Reads the flattened fields of one record, with per-field defaults.
pub struct FieldReader<'a> {
    prefix: &'static str,
    map: &'a HashMap<String, Value>,
}

impl<'a> FieldReader<'a> {
    pub(super) fn new(prefix: &'static str, map: &'a HashMap<String, Value>) -> Self {
        FieldReader { prefix, map }
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.map.get(&format!("{}.{}", self.prefix, field))
    }

    pub fn i64(&self, field: &str, default: i64) -> i64 {
        self.get(field).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn f64(&self, field: &str, default: f64) -> f64 {
        self.get(field).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn bool(&self, field: &str, default: bool) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn string(&self, field: &str, default: &str) -> String {
        self.get(field)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// A location is only present when both components are.
    pub fn location(&self, field: &str) -> Option<Location> {
        let latitude = self.get(&format!("{}.latitude", field))?.as_f64()?;
        let longitude = self.get(&format!("{}.longitude", field))?.as_f64()?;
        Some(Location::new(latitude, longitude))
    }

    /// Fixed-size integer array stored as `field1` .. `fieldN`.
    pub fn array<const N: usize>(&self, field: &str, default: i64) -> [i64; N] {
        let mut out = [default; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.i64(&format!("{}{}", field, i + 1), default);
        }
        out
    }
}
