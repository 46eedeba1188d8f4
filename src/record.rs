// src/record.rs

use std::fmt;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Value {
    /// The type tag of this value.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Str(_) => ColumnType::Str,
            Value::Int(_) => ColumnType::Int,
            Value::Float(_) => ColumnType::Float,
        }
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Decimal rendering, used when a string-typed column receives a number.
    pub fn render(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => itoa::Buffer::new().format(*i).to_string(),
            Value::Float(f) => ryu::Buffer::new().format(*f).to_string(),
        }
    }
}

/// Per-column type tag, fixed once established from the first data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Str,
    Int,
    Float,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Str => f.write_str("string"),
            ColumnType::Int => f.write_str("integer"),
            ColumnType::Float => f.write_str("float"),
        }
    }
}

/// Column labels from a detected header row, shared immutably between all
/// records of the stream once interned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
}

impl Header {
    pub fn new(names: Vec<String>) -> Self {
        Header { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// An ordered sequence of decoded fields, optionally carrying a reference to
/// the stream's header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
    header: Option<Arc<Header>>,
}

impl Record {
    pub(crate) fn new(values: Vec<Value>, header: Option<Arc<Header>>) -> Self {
        Record { values, header }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Serialize for Record {
    /// A record with a header serializes as a map keyed by column label,
    /// otherwise as a plain sequence.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.header {
            Some(h) if h.len() == self.values.len() => {
                let mut map = serializer.serialize_map(Some(self.values.len()))?;
                for (name, value) in h.names().iter().zip(&self.values) {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            _ => {
                let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
                for value in &self.values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_plain_decimal() {
        assert_eq!(Value::Int(42).render(), "42");
        assert_eq!(Value::Float(2.5).render(), "2.5");
        assert_eq!(Value::Float(3.0).render(), "3.0");
        assert_eq!(Value::Str("x".into()).render(), "x");
    }

    #[test]
    fn record_without_header_serializes_as_sequence() {
        let rec = Record::new(vec![Value::Int(1), Value::Str("a".into())], None);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"[1,"a"]"#);
    }

    #[test]
    fn record_with_header_serializes_as_map() {
        let header = Arc::new(Header::new(vec!["id".into(), "name".into()]));
        let rec = Record::new(
            vec![Value::Int(7), Value::Str("bob".into())],
            Some(header),
        );
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"id":7,"name":"bob"}"#);
    }
}
