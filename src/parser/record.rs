use serde_json::Value;

use super::flatten::FlattenError;
use super::value::Cell;

/// Values of one API object, in key order, keys dropped
pub type RawRecord = Vec<Cell>;

/// Parse a response body holding a JSON list of objects
///
/// Object key order is preserved (serde_json `preserve_order`); the
/// flatteners depend on it.
pub fn parse_records(body: &str) -> Result<Vec<RawRecord>, FlattenError> {
    let json: Value = serde_json::from_str(body)?;

    let items = match json {
        Value::Array(items) => items,
        other => return Err(FlattenError::NotAList(json_kind(&other))),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map.into_iter().map(|(_, v)| Cell::from_json(v)).collect()),
            other => Err(FlattenError::NotAnObject {
                index,
                found: json_kind(&other),
            }),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
