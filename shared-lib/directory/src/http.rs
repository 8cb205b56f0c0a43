//! Directory lookups over the host's REST user endpoints.

use std::time::Duration;

use async_trait::async_trait;
use error::DirectoryError;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::identity::UserInfo;
use crate::DirectoryService;

const ACCEPT_JSON: &str = "application/json;odata=nometadata";

/// Directory endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the hosting site
    pub site_url: String,
    /// Bearer token forwarded to the user endpoints
    pub access_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Lifetime of employee cache entries in seconds
    pub cache_ttl_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".to_string(),
            access_token: None,
            timeout_secs: 15,
            cache_ttl_secs: 300,
        }
    }
}

impl DirectoryConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DIRECTORY_SITE_URL") {
            config.site_url = url;
        }

        if let Ok(token) = std::env::var("DIRECTORY_ACCESS_TOKEN") {
            if !token.is_empty() {
                config.access_token = Some(token);
            }
        }

        if let Ok(timeout) = std::env::var("DIRECTORY_TIMEOUT_SECS") {
            if let Ok(n) = timeout.parse() {
                config.timeout_secs = n;
            }
        }

        if let Ok(ttl) = std::env::var("DIRECTORY_CACHE_TTL_SECS") {
            if let Ok(n) = ttl.parse() {
                config.cache_ttl_secs = n;
            }
        }

        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/_api/web/{}", self.site_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SiteUser {
    id: i64,
    title: String,
    email: String,
}

impl From<SiteUser> for UserInfo {
    fn from(user: SiteUser) -> Self {
        UserInfo::new(user.id, user.title, user.email)
    }
}

#[derive(Debug, Deserialize)]
struct GroupPage {
    value: Vec<serde_json::Value>,
}

/// Directory backed by the hosting site's user endpoints.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: Client,
    config: DirectoryConfig,
}

impl HttpDirectory {
    pub fn new(config: DirectoryConfig) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response, DirectoryError> {
        let mut request = self
            .client
            .get(self.config.url(path))
            .query(query)
            .header(header::ACCEPT, ACCEPT_JSON);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        request.send().await.map_err(|e| {
            tracing::warn!("Directory request failed: {}", e);
            DirectoryError::Unavailable(e.to_string())
        })
    }
}

fn status_error(status: StatusCode) -> DirectoryError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        DirectoryError::Unavailable(status.to_string())
    } else {
        DirectoryError::Malformed(format!("unexpected status {}", status))
    }
}

#[async_trait]
impl DirectoryService for HttpDirectory {
    async fn current_user(&self) -> Result<UserInfo, DirectoryError> {
        let response = self.get("currentuser", &[]).await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let user: SiteUser = response
            .json()
            .await
            .map_err(|e| DirectoryError::Malformed(e.to_string()))?;
        Ok(user.into())
    }

    async fn is_member_of_group(&self, group: &str) -> Result<bool, DirectoryError> {
        let filter = format!("Title eq '{}'", group.replace('\'', "''"));
        let response = self
            .get("currentuser/groups", &[("$filter", filter)])
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        let page: GroupPage = response
            .json()
            .await
            .map_err(|e| DirectoryError::Malformed(e.to_string()))?;
        Ok(!page.value.is_empty())
    }

    async fn employee_by_id(&self, id: i64) -> Result<Option<UserInfo>, DirectoryError> {
        let response = self.get(&format!("getuserbyid({})", id), &[]).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let user: SiteUser = response
                    .json()
                    .await
                    .map_err(|e| DirectoryError::Malformed(e.to_string()))?;
                Ok(Some(user.into()))
            }
            s => Err(status_error(s)),
        }
    }
}
