// REST TableApi implementation
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{error_from_response, error_from_transport, RestError};
use crate::query::{filter_pairs, parse_content_range, select_pairs};
use taskboard_core::port::{ApiError, Filter, RowQuery, TableApi};

/// Default HTTP client timeout (30s)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// REST adapter configuration
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://example.supabase.co`
    pub base_url: String,
    /// Sent as `apikey` and as the bearer token
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

/// PostgREST-style table API over HTTP
pub struct RestTableApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestTableApi {
    /// Create a new REST adapter
    ///
    /// # Example
    /// ```ignore
    /// let api = RestTableApi::new(RestConfig {
    ///     api_key: Some(key),
    ///     ..RestConfig::new("https://example.supabase.co")
    /// })?;
    /// ```
    pub fn new(config: RestConfig) -> Result<Self, RestError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| RestError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RestError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    /// Send and turn non-2xx responses into ApiError
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| error_from_transport(&e))?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Data API response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Value>, ApiError> {
        self.send(request)
            .await?
            .json::<Vec<Value>>()
            .await
            .map_err(|e| error_from_transport(&e))
    }
}

#[async_trait]
impl TableApi for RestTableApi {
    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>, ApiError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&select_pairs(query));
        self.rows(request).await
    }

    async fn insert(&self, table: &str, rows: &Value) -> Result<Vec<Value>, ApiError> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(rows);
        self.rows(request).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Value,
    ) -> Result<Vec<Value>, ApiError> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&filter_pairs(filters))
            .header("Prefer", "return=representation")
            .json(patch);
        self.rows(request).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, ApiError> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&filter_pairs(filters))
            .header("Prefer", "return=representation");
        self.rows(request).await
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, ApiError> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(filter_pairs(filters));
        let request = self
            .client
            .head(self.table_url(table))
            .query(&pairs)
            .header("Prefer", "count=exact");

        let response = self.send(request).await?;
        response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| ApiError::new("Response has no row count in Content-Range"))
    }
}
