use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;
use std::fmt;

/// One flattened value, before it is packed into a record
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    /// UTF-8 encoded string
    Text(Vec<u8>),
    List(Vec<Cell>),
}

impl Cell {
    /// The "no data" sentinel
    pub const SENTINEL: Cell = Cell::Int(-1);

    pub fn text(s: &str) -> Self {
        Cell::Text(s.as_bytes().to_vec())
    }

    /// Convert a parsed JSON value, dropping the keys of nested objects
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => Cell::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Cell::Text(s.into_bytes()),
            Value::Array(items) => Cell::List(items.into_iter().map(Cell::from_json).collect()),
            Value::Object(map) => {
                Cell::List(map.into_iter().map(|(_, v)| Cell::from_json(v)).collect())
            }
        }
    }

    /// JSON null, or the literal string "null"
    pub fn is_null_like(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(bytes) => bytes == b"null",
            _ => false,
        }
    }

    /// Replace null-like values with the sentinel
    pub fn or_sentinel(self) -> Self {
        if self.is_null_like() {
            Cell::SENTINEL
        } else {
            self
        }
    }

    /// Short name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Int(_) => "integer",
            Cell::Float(_) => "float",
            Cell::Bool(_) => "bool",
            Cell::Text(_) => "string",
            Cell::List(_) => "list",
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Bool(true) => write!(f, "True"),
            Cell::Bool(false) => write!(f, "False"),
            Cell::Text(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Cell::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_unit(),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(v) => serializer.serialize_f64(*v),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Text(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            Cell::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
