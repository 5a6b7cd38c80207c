//! HTTP exchange types shared by the client and its transports.
//!
//! # Design
//! Requests and responses are plain data. `SpireClient` builds an
//! `HttpRequest`, a `Transport` turns it into an `HttpResponse`, and the
//! client parses the result. Keeping the exchange as data lets tests script
//! the backend with a closure and lets the host bring its own HTTP stack.

use ureq::http::StatusCode;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is always absolute; the client resolves relative paths against its
/// root URL before building the request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// `read_error` is set when the status arrived but the body could not be
/// read; `body` is then empty.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub read_error: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            read_error: None,
        }
    }

    pub fn unreadable(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            body: String::new(),
            read_error: Some(reason.into()),
        }
    }

    /// Status line in the `"401 Unauthorized"` form.
    pub fn status_line(&self) -> String {
        match StatusCode::from_u16(self.status)
            .ok()
            .and_then(|code| code.canonical_reason())
        {
            Some(reason) => format!("{} {reason}", self.status),
            None => self.status.to_string(),
        }
    }
}
