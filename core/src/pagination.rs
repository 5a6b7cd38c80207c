//! Fetching complete result sets from `limit`/`start` paged collections.
//!
//! # Design
//! The backend caps every response at a fixed number of records and reports
//! the total match count on each page. `fetch_all` trusts only the count from
//! the first page, then walks offsets in whole multiples of the page size
//! until it holds that many records. Pages are fetched one after another and
//! appended in arrival order, which is also ascending offset order.
//!
//! A page that comes back empty before the count is reached ends the walk
//! with what has been gathered; an error on any page discards everything.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::auth::Credentials;
use crate::client::SpireClient;
use crate::error::ApiError;
use crate::filter::{encode_filter, Filter};
use crate::http::HttpMethod;
use crate::transport::Transport;
use crate::types::{Page, Record};

/// Upper bound on the up-front allocation for the accumulator, so a bogus
/// count cannot reserve unbounded memory before any page arrives.
const MAX_PREALLOCATED_RECORDS: u64 = 1_000_000;

/// Endpoint plus the fixed part of its paging query string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageQuery {
    path: String,
    query: String,
}

impl PageQuery {
    /// Keeps any query parameters already on `endpoint` except the paging
    /// ones, which are owned here.
    fn new(endpoint: &str, page_size: u64, filter: &str) -> Self {
        let (path, existing) = endpoint.split_once('?').unwrap_or((endpoint, ""));

        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
            if !matches!(key.as_ref(), "limit" | "start" | "filter") {
                query.append_pair(&key, &value);
            }
        }
        query.append_pair("limit", &page_size.to_string());
        if !filter.is_empty() {
            query.append_pair("filter", filter);
        }

        Self {
            path: path.to_string(),
            query: query.finish(),
        }
    }

    fn url(&self, start: Option<u64>) -> String {
        match start {
            Some(start) => format!("{}?{}&start={start}", self.path, self.query),
            None => format!("{}?{}", self.path, self.query),
        }
    }
}

impl<T: Transport> SpireClient<T> {
    /// Fetch every record of `endpoint` matching `filter`, decoded as `R`.
    ///
    /// The result holds `count` records as reported by the first page, unless
    /// the backend returns an empty page first, in which case the records
    /// gathered so far are returned.
    pub fn fetch_all<R>(
        &self,
        endpoint: &str,
        filter: Option<&Filter>,
        credentials: &Credentials,
    ) -> Result<Vec<R>, ApiError>
    where
        R: DeserializeOwned,
    {
        let page_size = self.config.page_size;
        let query = PageQuery::new(endpoint, page_size, &encode_filter(filter)?);

        let first: Page<R> = self.request_as(&query.url(None), credentials, HttpMethod::Get)?;
        let count = first.count;
        debug!(endpoint, count, received = first.records.len(), "first page fetched");

        if count <= page_size {
            return Ok(first.records);
        }

        let capacity = count.min(MAX_PREALLOCATED_RECORDS) as usize;
        let mut records = Vec::with_capacity(capacity);
        records.extend(first.records);

        let mut start = page_size;
        while (records.len() as u64) < count {
            let page: Page<R> = self
                .request_as(&query.url(Some(start)), credentials, HttpMethod::Get)
                .map_err(|source| ApiError::Page {
                    start,
                    source: Box::new(source),
                })?;

            if page.records.is_empty() {
                warn!(
                    endpoint,
                    start,
                    received = records.len(),
                    expected = count,
                    "empty page before reported count was reached, stopping pagination"
                );
                break;
            }

            debug!(endpoint, start, received = page.records.len(), "page fetched");
            records.extend(page.records);
            start += page_size;
        }

        Ok(records)
    }

    /// `fetch_all` with untyped records.
    pub fn fetch_records(
        &self,
        endpoint: &str,
        filter: Option<&Filter>,
        credentials: &Credentials,
    ) -> Result<Vec<Record>, ApiError> {
        self.fetch_all(endpoint, filter, credentials)
    }
}
