//! Request executor for the Spire API.
//!
//! # Design
//! Every backend call goes through `SpireClient::execute`: a request is built
//! as plain data (`build_request`), handed to the configured `Transport`, and
//! the response is interpreted by `parse_response`. Credentials travel with
//! each call and are never cached; the client holds only its configuration
//! and transport, so one client can serve any number of users and threads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Page, Record};

/// Blocking client for one backend.
#[derive(Debug, Clone)]
pub struct SpireClient<T = UreqTransport> {
    pub(crate) config: ClientConfig,
    transport: T,
}

impl SpireClient<UreqTransport> {
    /// Client with default settings and the ureq transport.
    pub fn new(root_url: &str) -> Self {
        Self::from_config(ClientConfig::new(root_url))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self { config, transport }
    }
}

impl<T: Transport> SpireClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Absolute URLs pass through; anything else is appended to the root URL.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
            format!("{}{path}", self.config.root_url)
        } else {
            format!("{}/{path}", self.config.root_url)
        }
    }

    pub fn build_request(
        &self,
        path: &str,
        credentials: &Credentials,
        method: HttpMethod,
        body: Option<String>,
    ) -> HttpRequest {
        let mut headers = vec![("authorization".to_string(), credentials.basic_auth_header())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url: self.resolve(path),
            headers,
            body,
        }
    }

    pub fn build_json_request<P>(
        &self,
        path: &str,
        credentials: &Credentials,
        method: HttpMethod,
        payload: &P,
    ) -> Result<HttpRequest, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_string(payload).map_err(ApiError::Serialization)?;
        Ok(self.build_request(path, credentials, method, Some(body)))
    }

    /// 200 decodes the body as a page; 201 and 204 yield an empty page
    /// whatever the body holds; any other status is an error.
    pub fn parse_response<R>(&self, response: HttpResponse) -> Result<Page<R>, ApiError>
    where
        R: DeserializeOwned,
    {
        match response.status {
            200 => {
                if let Some(reason) = &response.read_error {
                    return Err(ApiError::UnreadableBody {
                        code: response.status,
                        status: response.status_line(),
                        reason: reason.clone(),
                    });
                }
                serde_json::from_str(&response.body).map_err(ApiError::Deserialization)
            }
            201 | 204 => Ok(Page::default()),
            _ => Err(failure(response)),
        }
    }

    /// Issue a request without a body and decode records as `R`.
    pub fn request_as<R>(
        &self,
        path: &str,
        credentials: &Credentials,
        method: HttpMethod,
    ) -> Result<Page<R>, ApiError>
    where
        R: DeserializeOwned,
    {
        let request = self.build_request(path, credentials, method, None);
        let response = self.execute(request)?;
        self.parse_response(response)
    }

    /// Issue a request with `payload` as its JSON body and decode records as `R`.
    pub fn send_as<R, P>(
        &self,
        path: &str,
        credentials: &Credentials,
        method: HttpMethod,
        payload: &P,
    ) -> Result<Page<R>, ApiError>
    where
        R: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let request = self.build_json_request(path, credentials, method, payload)?;
        let response = self.execute(request)?;
        self.parse_response(response)
    }

    pub fn request(
        &self,
        path: &str,
        credentials: &Credentials,
        method: HttpMethod,
    ) -> Result<Page<Record>, ApiError> {
        self.request_as(path, credentials, method)
    }

    pub fn send<P>(
        &self,
        path: &str,
        credentials: &Credentials,
        method: HttpMethod,
        payload: &P,
    ) -> Result<Page<Record>, ApiError>
    where
        P: Serialize + ?Sized,
    {
        self.send_as(path, credentials, method, payload)
    }

    /// Check `credentials` by fetching the root URL. Only the status is
    /// inspected; the body is never decoded.
    pub fn validate(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let request = self.build_request("", credentials, HttpMethod::Get, None);
        let response = self.execute(request)?;
        if response.status == 200 {
            return Ok(());
        }
        Err(failure(response))
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self
            .transport
            .execute(&request)
            .map_err(|source| ApiError::Transport {
                url: request.url.clone(),
                source,
            })?;
        debug!(status = response.status, url = %request.url, "response received");
        Ok(response)
    }
}

fn failure(response: HttpResponse) -> ApiError {
    let status = response.status_line();
    match response.read_error {
        Some(reason) => ApiError::UnreadableBody {
            code: response.status,
            status,
            reason,
        },
        None => ApiError::Status {
            code: response.status,
            status,
            body: response.body,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::TransportError;

    const ROOT: &str = "https://spire.local:10880/api/v2/companies/acme";

    fn creds() -> Credentials {
        Credentials::new("user", "pass")
    }

    fn client_with<F>(transport: F) -> SpireClient<F>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
    {
        SpireClient::with_transport(ClientConfig::new(ROOT), transport)
    }

    fn respond(
        status: u16,
        body: &'static str,
    ) -> impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync {
        move |_: &HttpRequest| Ok(HttpResponse::new(status, body))
    }

    #[test]
    fn build_request_without_body() {
        let client = client_with(respond(200, "{}"));
        let req = client.build_request("/sales/orders", &creds(), HttpMethod::Get, None);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{ROOT}/sales/orders"));
        assert_eq!(req.header("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert!(req.header("content-type").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_json_request_sets_content_type() {
        let client = client_with(respond(201, ""));
        let payload = json!({"customer": {"customerNo": "C1"}});
        let req = client
            .build_json_request("/sales/orders", &creds(), HttpMethod::Post, &payload)
            .unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), Some("Basic dXNlcjpwYXNz"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["customer"]["customerNo"], "C1");
    }

    #[test]
    fn absolute_urls_are_not_rebased() {
        let client = client_with(respond(200, "{}"));
        assert_eq!(client.resolve("http://other.host/x?limit=1"), "http://other.host/x?limit=1");
        assert_eq!(client.resolve("sales/orders"), format!("{ROOT}/sales/orders"));
        assert_eq!(client.resolve(""), ROOT);
    }

    #[test]
    fn ok_decodes_page() {
        let client = client_with(respond(200, r#"{"records":[{"id":1},{"id":2}],"count":2}"#));
        let page = client.request("/sales/orders", &creds(), HttpMethod::Get).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.records[1]["id"], 2);
    }

    #[test]
    fn ok_with_bad_json_is_deserialization_error() {
        let client = client_with(respond(200, "not json"));
        let err = client.request("/sales/orders", &creds(), HttpMethod::Get).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn created_and_no_content_ignore_body() {
        for status in [201, 204] {
            let client = client_with(respond(status, "this is not json"));
            let page = client.request("/sales/orders/1", &creds(), HttpMethod::Delete).unwrap();
            assert!(page.records.is_empty(), "status {status}");
            assert_eq!(page.count, 0, "status {status}");
        }
    }

    #[test]
    fn unauthorized_carries_status_text_and_body() {
        let client = client_with(respond(401, "bad user"));
        let err = client.request("/sales/orders", &creds(), HttpMethod::Get).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401 Unauthorized"), "{msg}");
        assert!(msg.contains("bad user"), "{msg}");
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn not_found_is_a_plain_status_error() {
        let client = client_with(respond(404, "no such order"));
        let err = client.request("/sales/orders/99", &creds(), HttpMethod::Get).unwrap_err();
        assert!(matches!(err, ApiError::Status { code: 404, .. }));
    }

    #[test]
    fn unreadable_failure_body_carries_read_error() {
        let client = client_with(|_: &HttpRequest| Ok(HttpResponse::unreadable(500, "connection reset")));
        let err = client.request("/sales/orders", &creds(), HttpMethod::Get).unwrap_err();
        match err {
            ApiError::UnreadableBody { code, status, reason } => {
                assert_eq!(code, 500);
                assert_eq!(status, "500 Internal Server Error");
                assert_eq!(reason, "connection reset");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn transport_failure_is_distinct() {
        let client = client_with(|_: &HttpRequest| Err(TransportError::Connection("refused".to_string())));
        let err = client.request("/sales/orders", &creds(), HttpMethod::Get).unwrap_err();
        match err {
            ApiError::Transport { url, source } => {
                assert_eq!(url, format!("{ROOT}/sales/orders"));
                assert!(matches!(source, TransportError::Connection(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unserializable_payload_is_serialization_error() {
        let client = client_with(respond(201, ""));
        let mut payload = std::collections::HashMap::new();
        payload.insert(vec![1u8], "vector keys cannot be JSON keys");
        let err = client
            .send("/sales/orders", &creds(), HttpMethod::Post, &payload)
            .unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }

    #[test]
    fn validate_hits_root_with_auth_and_no_body() {
        let seen = Mutex::new(Vec::new());
        let client = client_with(|req: &HttpRequest| {
            seen.lock().unwrap().push(req.clone());
            Ok(HttpResponse::new(200, "<html>not json</html>"))
        });
        client.validate(&creds()).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[0].url, ROOT);
        assert_eq!(seen[0].header("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert!(seen[0].body.is_none());
    }

    #[test]
    fn validate_forbidden_reports_status_and_body() {
        let client = client_with(respond(403, "invalid credentials"));
        let err = client.validate(&creds()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("403"), "{msg}");
        assert!(msg.contains("invalid credentials"), "{msg}");
    }

    #[test]
    fn validate_rejects_created() {
        let client = client_with(respond(201, ""));
        assert!(client.validate(&creds()).is_err());
    }
}
