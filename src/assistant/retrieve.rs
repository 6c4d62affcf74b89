use super::error::{PipelineError, Stage};
use super::types::Intent;
use crate::core::errors::ApiError;
use crate::scrape::types::EvidenceDocument;
use crate::scrape::ScraperPool;

/// Which scraper a page needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    Product,
    Symptom,
}

/// Wraps the scraping collaborator. Scrape failures never escape as errors.
pub struct ContentRetriever {
    pool: ScraperPool,
}

impl ContentRetriever {
    pub fn new(pool: ScraperPool) -> Self {
        Self { pool }
    }

    /// `None` on any failure, timeout, or empty page.
    pub async fn retrieve(&self, url: &str, shape: PageShape) -> Option<EvidenceDocument> {
        match self.fetch(url, shape).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!("Scrape of {} failed: {}", url, err);
                None
            }
        }
    }

    /// Like [`retrieve`](Self::retrieve) but reports why, for the router's
    /// user-facing message.
    pub async fn retrieve_for(
        &self,
        intent: Intent,
        url: &str,
        shape: PageShape,
    ) -> Result<EvidenceDocument, PipelineError> {
        match self.fetch(url, shape).await {
            Ok(Some(document)) => Ok(document),
            Ok(None) => {
                tracing::warn!("Scrape of {} produced no document", url);
                Err(PipelineError::RetrievalFailure(intent))
            }
            Err(ApiError::Timeout(msg)) => {
                tracing::warn!("Scrape of {} timed out: {}", url, msg);
                Err(PipelineError::Timeout {
                    intent,
                    stage: Stage::Retrieve,
                })
            }
            Err(err) => {
                tracing::warn!("Scrape of {} failed: {}", url, err);
                Err(PipelineError::RetrievalFailure(intent))
            }
        }
    }

    async fn fetch(&self, url: &str, shape: PageShape) -> Result<Option<EvidenceDocument>, ApiError> {
        tracing::info!("Scraping {:?} page: {}", shape, url);
        match shape {
            PageShape::Product => self.pool.scrape_product(url).await,
            PageShape::Symptom => self.pool.scrape_symptom(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::settings::Settings;
    use crate::testing::StubScraper;
    use std::sync::Arc;

    fn retriever(scraper: StubScraper) -> ContentRetriever {
        let settings = Settings::default();
        ContentRetriever::new(ScraperPool::new(
            Arc::new(scraper),
            &settings.scraper,
            &settings.timeouts,
        ))
    }

    #[tokio::test]
    async fn collaborator_errors_become_not_found() {
        let retriever = retriever(StubScraper::new().failing_first(usize::MAX));
        assert_eq!(retriever.retrieve("https://x", PageShape::Product).await, None);
        assert!(matches!(
            retriever
                .retrieve_for(Intent::Installation, "https://x", PageShape::Product)
                .await,
            Err(PipelineError::RetrievalFailure(Intent::Installation))
        ));
    }

    #[tokio::test]
    async fn shape_selects_the_scraper() {
        let doc = EvidenceDocument {
            symptom_title: "Not making ice".to_string(),
            diagnosis_steps: vec!["Check water supply".to_string()],
            ..Default::default()
        };
        let retriever = retriever(StubScraper::new().with_symptom("https://s", doc.clone()));

        assert_eq!(retriever.retrieve("https://s", PageShape::Symptom).await, Some(doc));
        assert_eq!(retriever.retrieve("https://s", PageShape::Product).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_scrapes_time_out() {
        let mut settings = Settings::default();
        settings.timeouts.scrape = std::time::Duration::from_millis(10);
        let scraper = StubScraper::new().with_delay(std::time::Duration::from_secs(60));
        let retriever = ContentRetriever::new(ScraperPool::new(
            Arc::new(scraper),
            &settings.scraper,
            &settings.timeouts,
        ));

        let err = retriever
            .retrieve_for(Intent::Compatibility, "https://x", PageShape::Product)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PipelineError::Timeout {
                intent: Intent::Compatibility,
                stage: Stage::Retrieve
            }
        );
    }
}
