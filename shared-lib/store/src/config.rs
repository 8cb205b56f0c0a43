//! Record store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the site hosting the lists
    pub site_url: String,
    /// Bearer token forwarded to the list API, if the host requires one
    pub access_token: Option<String>,
    /// Default page size for list queries
    pub page_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Create a new store configuration.
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            ..Self::default()
        }
    }

    /// Set the bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the default page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("STORE_SITE_URL") {
            config.site_url = url;
        }

        if let Ok(token) = std::env::var("STORE_ACCESS_TOKEN") {
            if !token.is_empty() {
                config.access_token = Some(token);
            }
        }

        if let Ok(size) = std::env::var("STORE_PAGE_SIZE") {
            if let Ok(n) = size.parse() {
                config.page_size = n;
            }
        }

        if let Ok(timeout) = std::env::var("STORE_TIMEOUT_SECS") {
            if let Ok(n) = timeout.parse() {
                config.timeout_secs = n;
            }
        }

        config
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the items endpoint for a list.
    pub fn items_url(&self, collection: &str) -> String {
        format!(
            "{}/_api/web/lists/getbytitle('{}')/items",
            self.site_url.trim_end_matches('/'),
            collection.replace('\'', "''")
        )
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".to_string(),
            access_token: None,
            page_size: 500,
            timeout_secs: 30,
        }
    }
}
