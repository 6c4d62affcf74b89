use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use super::types::EvidenceDocument;
use crate::core::errors::ApiError;

/// Page-scraping collaborator. `Ok(None)` means the page had nothing usable.
#[async_trait]
pub trait ScrapeClient: Send + Sync {
    async fn scrape_product(
        &self,
        url: &str,
        headless: bool,
    ) -> Result<Option<EvidenceDocument>, ApiError>;

    async fn scrape_symptom(&self, url: &str) -> Result<Option<EvidenceDocument>, ApiError>;
}

/// Talks to the headless-browser scraping service over HTTP.
///
/// `POST /scrape/product {url, headless}` and `POST /scrape/symptom {url}`
/// answer with a JSON document, or 404 when the page could not be parsed.
#[derive(Clone)]
pub struct HttpScrapeClient {
    base_url: String,
    client: Client,
}

impl HttpScrapeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    async fn fetch(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<Option<EvidenceDocument>, ApiError> {
        let url = format!("{}/scrape/{}", self.base_url, endpoint);
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("Scraper returned {}: {}", status, text);
            return Err(if status.is_server_error() {
                ApiError::Upstream(message)
            } else {
                ApiError::Internal(message)
            });
        }

        let document: EvidenceDocument = response.json().await.map_err(ApiError::internal)?;
        let document = document.normalized();
        if document.is_empty() {
            tracing::debug!("Scraper returned an empty document for {}", url);
            return Ok(None);
        }
        Ok(Some(document))
    }
}

#[async_trait]
impl ScrapeClient for HttpScrapeClient {
    async fn scrape_product(
        &self,
        url: &str,
        headless: bool,
    ) -> Result<Option<EvidenceDocument>, ApiError> {
        let mut document = self
            .fetch("product", json!({ "url": url, "headless": headless }))
            .await?;
        if let Some(doc) = document.as_mut() {
            doc.url.get_or_insert_with(|| url.to_string());
        }
        Ok(document)
    }

    async fn scrape_symptom(&self, url: &str) -> Result<Option<EvidenceDocument>, ApiError> {
        let mut document = self.fetch("symptom", json!({ "url": url })).await?;
        if let Some(doc) = document.as_mut() {
            doc.url.get_or_insert_with(|| url.to_string());
        }
        Ok(document)
    }
}
