//! Decoded value model.
//!
//! The decoder lowers markup text into a [`DecodedValue`] tree driven by the
//! schema; derived `from_decoded` impls then pull typed values out of it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A dynamically-typed value resolved from markup content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecodedValue {
    /// No value: an absent optional field or absorbed coercion failure.
    Null,
    /// Text content, also used for matched enum values.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// True/false.
    Boolean(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Combined date and time.
    DateTime(NaiveDateTime),
    /// List of element values, in markup order.
    List(Vec<DecodedValue>),
    /// A nested decoded object.
    Object(DecodedObject),
}

impl DecodedValue {
    /// Whether this is [`DecodedValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, DecodedValue::Null)
    }

    /// A short label for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DecodedValue::Null => "null",
            DecodedValue::Text(_) => "text",
            DecodedValue::Integer(_) => "integer",
            DecodedValue::Float(_) => "float",
            DecodedValue::Boolean(_) => "boolean",
            DecodedValue::Date(_) => "date",
            DecodedValue::Time(_) => "time",
            DecodedValue::DateTime(_) => "datetime",
            DecodedValue::List(_) => "list",
            DecodedValue::Object(_) => "object",
        }
    }
}

/// An ordered field-name to value map for one decoded object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedObject {
    entries: IndexMap<String, DecodedValue>,
}

impl DecodedObject {
    /// Create an empty decoded object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field value, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, value: DecodedValue) {
        self.entries.insert(name.into(), value);
    }

    /// Look up a field value.
    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.entries.get(name)
    }

    /// Number of resolved fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fields were resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over resolved fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_preserves_insertion_order() {
        let mut obj = DecodedObject::new();
        obj.insert("z", DecodedValue::Integer(1));
        obj.insert("a", DecodedValue::Text("x".into()));
        let names: Vec<_> = obj.names().collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn serializes_as_plain_json() {
        let mut obj = DecodedObject::new();
        obj.insert("count", DecodedValue::Integer(3));
        obj.insert("note", DecodedValue::Null);
        obj.insert(
            "tags",
            DecodedValue::List(vec![DecodedValue::Text("a".into())]),
        );
        let json = serde_json::to_string(&obj).unwrap();
        assert_eq!(json, r#"{"count":3,"note":null,"tags":["a"]}"#);
    }

    #[test]
    fn kind_names_cover_variants() {
        assert_eq!(DecodedValue::Null.kind_name(), "null");
        assert_eq!(DecodedValue::Boolean(true).kind_name(), "boolean");
        assert_eq!(DecodedValue::Object(DecodedObject::new()).kind_name(), "object");
    }
}
