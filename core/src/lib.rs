//! Blocking client for the Spire inventory/ERP REST API.
//!
//! # Overview
//! Issues Basic-authenticated JSON requests against a backend rooted at
//! `https://{host}:{port}/api/{version}/{tenant}` and reassembles complete
//! result sets from the backend's `limit`/`start` paged collections.
//!
//! # Design
//! - `SpireClient` holds only its `ClientConfig` and a `Transport`; callers
//!   pass `Credentials` into every call and nothing is cached between calls.
//! - Requests and responses cross the transport as plain data
//!   (`HttpRequest`/`HttpResponse`), so the host can supply its own HTTP
//!   stack and tests can script the backend with a closure.
//! - `fetch_all` is generic over the record type; `fetch_records` is the
//!   untyped (`Record`) instantiation of the same code path.
//! - Everything is synchronous: a call returns once its exchange, or its
//!   whole page sequence, has finished or failed.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod orders;
pub mod pagination;
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::SpireClient;
pub use config::ClientConfig;
pub use error::{ApiError, TransportError};
pub use filter::{any_of, encode_filter, encode_filter_value, Filter};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{Page, Record, SalesOrderItem};
