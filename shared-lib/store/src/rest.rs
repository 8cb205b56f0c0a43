//! REST list store client.
//!
//! Talks to an OData-style list API (`/_api/web/lists/getbytitle('..')/items`)
//! using `nometadata` JSON. Updates and deletes go through `POST` with an
//! `X-HTTP-Method` override.

use async_trait::async_trait;
use error::StoreError;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::query::Query;
use crate::{Record, RecordStore};

const ACCEPT_JSON: &str = "application/json;odata=nometadata";

#[derive(Debug, Deserialize)]
struct ListPage {
    value: Vec<Record>,
    #[serde(rename = "odata.nextLink")]
    next_link: Option<String>,
}

/// Record store backed by a hosted list REST API.
#[derive(Debug, Clone)]
pub struct RestListStore {
    client: Client,
    config: StoreConfig,
}

impl RestListStore {
    /// Create a new REST store.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        tracing::info!("Creating list store client for {}", config.site_url);

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                StoreError::Unavailable(e.to_string())
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Query-string pairs for a list request.
    pub fn query_params(&self, query: &Query) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !query.filter.is_empty() {
            params.push(("$filter", query.filter.to_odata()));
        }
        if let Some(order) = &query.order_by {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("$orderby", format!("{} {}", order.field, direction)));
        }
        let top = query.page_size.unwrap_or(self.config.page_size);
        params.push(("$top", top.to_string()));
        params
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(header::ACCEPT, ACCEPT_JSON);
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        collection: &str,
        id: Option<i64>,
    ) -> Result<Response, StoreError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::warn!(collection, "List request failed: {}", e);
            StoreError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(collection, %status, "List request rejected: {}", body);
        Err(match (status, id) {
            (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound {
                collection: collection.to_string(),
                id,
            },
            (s, _) if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                StoreError::Unavailable(format!("{}: {}", s, body))
            }
            (s, _) => StoreError::RequestFailed(format!("{}: {}", s, body)),
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for RestListStore {
    async fn list(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        let url = self.config.items_url(collection);
        let request = self.client.get(&url).query(&self.query_params(query));
        let mut page: ListPage = Self::decode(self.send(request, collection, None).await?).await?;
        let mut rows = std::mem::take(&mut page.value);

        // An explicit page size asks for exactly one page.
        if query.page_size.is_none() {
            while let Some(next) = page.next_link.take() {
                let request = self.client.get(&next);
                page = Self::decode(self.send(request, collection, None).await?).await?;
                rows.append(&mut page.value);
            }
        }

        tracing::debug!(collection, count = rows.len(), "records listed");
        Ok(rows)
    }

    async fn create(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        let url = self.config.items_url(collection);
        let request = self.client.post(&url).json(&Value::Object(record));
        let created: Record = Self::decode(self.send(request, collection, None).await?).await?;
        Ok(created)
    }

    async fn update(&self, collection: &str, id: i64, partial: Record) -> Result<(), StoreError> {
        let url = format!("{}({})", self.config.items_url(collection), id);
        let request = self
            .client
            .post(&url)
            .header("X-HTTP-Method", "MERGE")
            .header(header::IF_MATCH, "*")
            .json(&Value::Object(partial));
        self.send(request, collection, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: i64) -> Result<(), StoreError> {
        let url = format!("{}({})", self.config.items_url(collection), id);
        let request = self
            .client
            .post(&url)
            .header("X-HTTP-Method", "DELETE")
            .header(header::IF_MATCH, "*");
        self.send(request, collection, Some(id)).await?;
        Ok(())
    }
}
