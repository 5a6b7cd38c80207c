//! Connection settings for one backend.

use std::time::Duration;

/// Per-exchange timeout applied by the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest page the backend hands out in one call.
pub const DEFAULT_PAGE_SIZE: u64 = 10_000;

/// Settings for a `SpireClient`.
///
/// `root_url` has the form `https://{host}:{port}/api/{version}/{tenant}`;
/// a trailing `/` is dropped so relative paths can be appended directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub root_url: String,
    pub timeout: Duration,
    pub page_size: u64,
}

impl ClientConfig {
    pub fn new(root_url: &str) -> Self {
        Self {
            root_url: root_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `limit` sent on paging requests. Zero is clamped to one.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("https://spire.local:10880/api/v2/companies/acme/");
        assert_eq!(config.root_url, "https://spire.local:10880/api/v2/companies/acme");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.page_size, 10_000);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let config = ClientConfig::new("http://localhost").with_page_size(0);
        assert_eq!(config.page_size, 1);
    }
}
