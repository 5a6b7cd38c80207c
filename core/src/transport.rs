//! Executes plain-data requests against the network.
//!
//! # Design
//! The client never talks to a socket directly; it hands each `HttpRequest`
//! to a `Transport`. `UreqTransport` is the default. Any closure with the
//! right signature is also a transport, which is how tests stand in for the
//! backend. Implementations must be shareable across threads since one
//! client may serve concurrent callers.

use std::io;
use std::time::Duration;

use ureq::{Agent, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Upper bound on a response body. A full page of records is well past
/// ureq's default cap.
const MAX_BODY_BYTES: u64 = 1 << 30;

/// Performs one HTTP exchange.
///
/// Every status code, success or not, must come back as `Ok(HttpResponse)`;
/// `Err` is reserved for exchanges that produced no status at all.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking transport backed by a pooled `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, None) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Get, Some(body)) => with_headers(self.agent.get(url), headers)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Delete, None) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Delete, Some(body)) => with_headers(self.agent.delete(url), headers)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
        };

        let mut response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let (body, read_error) = match response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
        {
            Ok(body) => (body, None),
            Err(e) => (String::new(), Some(e.to_string())),
        };

        Ok(HttpResponse {
            status,
            body,
            read_error,
        })
    }
}

/// Timeouts surface either as ureq's own timer or as a timed-out socket.
fn classify(error: ureq::Error) -> TransportError {
    match &error {
        ureq::Error::Timeout(_) => TransportError::Timeout(error.to_string()),
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => {
            TransportError::Timeout(error.to_string())
        }
        _ => TransportError::Connection(error.to_string()),
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
