//! Sales-order convenience calls.
//!
//! Thin wrappers that fix the endpoint and payload shape; all behavior comes
//! from the request executor and `fetch_all`.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::Credentials;
use crate::client::SpireClient;
use crate::error::ApiError;
use crate::filter::any_of;
use crate::http::HttpMethod;
use crate::transport::Transport;
use crate::types::{Page, Record};

pub const SALES_ORDERS_PATH: &str = "/sales/orders";
pub const SALES_ITEMS_PATH: &str = "/sales/items";

/// Field line items are matched on when fetching by order.
const ORDER_NO_FIELD: &str = "orderNo";

impl<T: Transport> SpireClient<T> {
    /// POST a fully prepared sales order. The backend answers 201 with no
    /// body, so a successful call yields an empty page.
    pub fn create_sales_order<P>(
        &self,
        credentials: &Credentials,
        payload: &P,
    ) -> Result<Page<Record>, ApiError>
    where
        P: Serialize + ?Sized,
    {
        self.send(SALES_ORDERS_PATH, credentials, HttpMethod::Post, payload)
    }

    /// DELETE each order in turn, stopping at the first failure.
    pub fn delete_sales_orders<I>(&self, credentials: &Credentials, ids: &[I]) -> Result<(), ApiError>
    where
        I: Display,
    {
        for id in ids {
            let path = format!("{SALES_ORDERS_PATH}/{id}");
            self.request(&path, credentials, HttpMethod::Delete)
                .map_err(|source| ApiError::DeleteOrder {
                    id: id.to_string(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    /// All line items belonging to any of `order_numbers`.
    ///
    /// An empty set of order numbers matches nothing and sends no request.
    pub fn fetch_order_items<R, S>(
        &self,
        credentials: &Credentials,
        order_numbers: &[S],
    ) -> Result<Vec<R>, ApiError>
    where
        R: DeserializeOwned,
        S: AsRef<str>,
    {
        if order_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let filter = any_of(
            ORDER_NO_FIELD,
            order_numbers.iter().map(|n| Value::from(n.as_ref())),
        );
        self.fetch_all(SALES_ITEMS_PATH, Some(&filter), credentials)
    }
}
