use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::client::ScrapeClient;
use super::types::EvidenceDocument;
use crate::core::config::settings::{ScraperSettings, Timeouts};
use crate::core::errors::ApiError;
use crate::core::retry::with_single_retry;

/// Caps how many browser sessions the scraping service runs on our behalf.
///
/// Each scrape holds one permit for its whole duration, including the retry.
#[derive(Clone)]
pub struct ScraperPool {
    client: Arc<dyn ScrapeClient>,
    permits: Arc<Semaphore>,
    headless: bool,
    acquire_timeout: Duration,
    scrape_timeout: Duration,
}

impl ScraperPool {
    pub fn new(client: Arc<dyn ScrapeClient>, settings: &ScraperSettings, timeouts: &Timeouts) -> Self {
        let capacity = settings.max_concurrent.max(1);
        Self {
            client,
            permits: Arc::new(Semaphore::new(capacity)),
            headless: settings.headless,
            acquire_timeout: timeouts.pool_acquire,
            scrape_timeout: timeouts.scrape,
        }
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn scrape_product(&self, url: &str) -> Result<Option<EvidenceDocument>, ApiError> {
        let _permit = self.acquire().await?;
        let headless = self.headless;
        with_single_retry("product scrape", self.scrape_timeout, || {
            self.client.scrape_product(url, headless)
        })
        .await
    }

    pub async fn scrape_symptom(&self, url: &str) -> Result<Option<EvidenceDocument>, ApiError> {
        let _permit = self.acquire().await?;
        with_single_retry("symptom scrape", self.scrape_timeout, || {
            self.client.scrape_symptom(url)
        })
        .await
    }

    async fn acquire(&self) -> Result<tokio::sync::OwnedSemaphorePermit, ApiError> {
        let acquire = self.permits.clone().acquire_owned();
        match tokio::time::timeout(self.acquire_timeout, acquire).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(ApiError::Internal("Scraper pool is closed".to_string())),
            Err(_) => Err(ApiError::Timeout(format!(
                "No scraper available within {:?}",
                self.acquire_timeout
            ))),
        }
    }
}
