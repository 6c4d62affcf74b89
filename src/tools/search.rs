use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::core::config::settings::SearchSettings;
use crate::core::errors::ApiError;

const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search scoped by the caller's query string.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, ApiError>;
}

/// Google Custom Search JSON API.
#[derive(Clone)]
pub struct GoogleSearchProvider {
    api_key: String,
    engine_id: String,
    endpoint: String,
    client: Client,
}

impl GoogleSearchProvider {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            engine_id: settings.engine_id.clone(),
            endpoint: GOOGLE_CSE_ENDPOINT.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.engine_id.is_empty()
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, ApiError> {
        if !self.has_credentials() {
            tracing::warn!("Google search credentials missing; returning no results");
            return Ok(Vec::new());
        }

        // The API rejects num > 10.
        let num = num_results.clamp(1, 10);
        let url = format!(
            "{}?key={}&cx={}&q={}&num={}",
            self.endpoint,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.engine_id),
            urlencoding::encode(query),
            num
        );

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("Google search failed: {}", status);
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                ApiError::Upstream(message)
            } else {
                ApiError::Internal(message)
            });
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        let items = payload
            .get("items")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut results = Vec::new();
        for item in items {
            let title = item
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let url = item
                .get("link")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let snippet = item
                .get("snippet")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            if !url.is_empty() {
                results.push(SearchResult {
                    title,
                    url,
                    snippet,
                });
            }
        }

        results.truncate(num);
        Ok(results)
    }
}
