//! Error types for the Spire API client.
//!
//! # Design
//! Every failure a call can hit lands in a single `ApiError` so callers
//! match on one type. Backend-reported failures keep the status line and the
//! raw body text; transport and JSON failures wrap their cause. There is no
//! dedicated 404 variant: the backend's "not found" is just another status.

use thiserror::Error;

/// Errors returned by `SpireClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a status outside {200, 201, 204}.
    #[error("API request failed with status {status}. Details: {body}")]
    Status { code: u16, status: String, body: String },

    /// The status arrived but the response body could not be read.
    #[error("could not read response body (status {status}): {reason}")]
    UnreadableBody { code: u16, status: String, reason: String },

    /// The HTTP exchange itself failed (connect, DNS, timeout).
    #[error("error making request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("failed to marshal payload: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be decoded into the expected shape.
    #[error("error unmarshaling JSON: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The filter expression could not be encoded.
    #[error("failed to marshal filter to JSON: {0}")]
    Filter(#[source] serde_json::Error),

    /// A page after the first failed; accumulated records were discarded.
    #[error("error making Spire request starting at {start}: {source}")]
    Page {
        start: u64,
        #[source]
        source: Box<ApiError>,
    },

    /// Deleting one order of a batch failed; later orders were not attempted.
    #[error("failed to delete sales order {id}: {source}")]
    DeleteOrder {
        id: String,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// HTTP status code of a backend-reported failure, looking through the
    /// paging and batch-delete wrappers. `None` for transport and JSON errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { code, .. } | ApiError::UnreadableBody { code, .. } => Some(*code),
            ApiError::Page { source, .. } | ApiError::DeleteOrder { source, .. } => {
                source.status_code()
            }
            _ => None,
        }
    }
}

/// Failures raised by a `Transport` before any status was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_looks_through_wrappers() {
        let inner = ApiError::Status {
            code: 503,
            status: "503 Service Unavailable".to_string(),
            body: "try later".to_string(),
        };
        let wrapped = ApiError::Page {
            start: 10_000,
            source: Box::new(inner),
        };
        assert_eq!(wrapped.status_code(), Some(503));

        let transport = ApiError::Transport {
            url: "http://localhost".to_string(),
            source: TransportError::Timeout("deadline elapsed".to_string()),
        };
        assert_eq!(transport.status_code(), None);
    }

    #[test]
    fn page_error_message_carries_offset_and_cause() {
        let err = ApiError::Page {
            start: 20_000,
            source: Box::new(ApiError::Status {
                code: 500,
                status: "500 Internal Server Error".to_string(),
                body: "boom".to_string(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("20000"));
        assert!(msg.contains("500 Internal Server Error"));
        assert!(msg.contains("boom"));
    }
}
