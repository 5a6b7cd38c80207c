//! Response envelope and record shapes.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// An untyped backend record: a JSON object kept losslessly.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One page of a collection response.
///
/// `count` is the total number of records matching the query across all
/// pages, not the length of `records`. Mutations answered with 201/204
/// produce an empty page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T = Record> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default, deserialize_with = "count_from_number")]
    pub count: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            count: 0,
        }
    }
}

/// The backend reports `count` as a JSON number that may carry a fraction
/// part (`25000.0`); anything non-negative is accepted.
fn count_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_u64()
        .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .ok_or_else(|| D::Error::custom(format!("invalid record count {number}")))
}

/// A sales-order line item as returned by `/sales/items`.
///
/// Only the fields the client itself relies on are named; everything else
/// the backend sends is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub order_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}
