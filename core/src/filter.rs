//! Filter expressions and their query-string encoding.
//!
//! The backend takes a filter as a single JSON document in the `filter`
//! query parameter, e.g. `{"$or":[{"orderNo":"1"},{"orderNo":"2"}]}`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A filter expression: field or operator name to value. Values may nest
/// (`$or` takes an array of sub-filters).
pub type Filter = Map<String, Value>;

/// Encode a filter for the `filter` query parameter.
///
/// An absent or empty filter encodes to `""`, meaning the parameter is
/// omitted entirely.
pub fn encode_filter(filter: Option<&Filter>) -> Result<String, ApiError> {
    match filter {
        Some(filter) if !filter.is_empty() => encode_filter_value(filter),
        _ => Ok(String::new()),
    }
}

/// Encode any serializable filter shape.
///
/// Values that serialize to `null`, `{}` or `[]` encode to `""`.
pub fn encode_filter_value<F>(filter: &F) -> Result<String, ApiError>
where
    F: Serialize + ?Sized,
{
    let value = serde_json::to_value(filter).map_err(ApiError::Filter)?;
    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(String::new());
    }
    serde_json::to_string(&value).map_err(ApiError::Filter)
}

/// `{"$or": [{field: v1}, {field: v2}, ...]}`
pub fn any_of<I, V>(field: &str, values: I) -> Filter
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let conditions = values
        .into_iter()
        .map(|v| {
            let mut condition = Map::new();
            condition.insert(field.to_string(), v.into());
            Value::Object(condition)
        })
        .collect();

    let mut filter = Map::new();
    filter.insert("$or".to_string(), Value::Array(conditions));
    filter
}
