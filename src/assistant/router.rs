//! Per-query orchestration: scope check, classification, extraction, then one
//! intent workflow (locate, retrieve, index, compose).

use std::sync::Arc;

use super::classify::IntentClassifier;
use super::compose::{select_top_part, ResponseComposer};
use super::error::{LocatorTarget, MissingField, PipelineError};
use super::extract::EntityExtractor;
use super::locate::EvidenceLocator;
use super::retrieve::{ContentRetriever, PageShape};
use super::scope::is_in_scope;
use super::types::{ChatOutcome, EntitySet, Intent, Query};
use crate::core::config::Settings;
use crate::llm::{ChatMessage, LlmService};
use crate::rag::{IndexHits, IndexWrite, SemanticIndex};
use crate::scrape::types::EvidenceDocument;
use crate::scrape::ScraperPool;
use crate::tools::search::SearchProvider;

/// Symptom pages tried before giving up on troubleshooting evidence.
const MAX_SYMPTOM_PAGES: usize = 3;

pub struct QueryRouter {
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    locator: EvidenceLocator,
    retriever: ContentRetriever,
    index: Arc<SemanticIndex>,
    composer: ResponseComposer,
}

impl QueryRouter {
    pub fn new(
        llm: LlmService,
        search: Arc<dyn SearchProvider>,
        pool: ScraperPool,
        index: Arc<SemanticIndex>,
        settings: &Settings,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(llm.clone(), settings.classifier),
            extractor: EntityExtractor::new(llm.clone()),
            locator: EvidenceLocator::new(search, &settings.search, settings.timeouts.search),
            retriever: ContentRetriever::new(pool),
            index,
            composer: ResponseComposer::new(llm),
        }
    }

    pub fn index(&self) -> &SemanticIndex {
        &self.index
    }

    /// Runs one query to completion. Every pipeline failure comes back as an
    /// error outcome carrying its user-facing message.
    pub async fn handle(&self, query: &Query, history: &[ChatMessage]) -> ChatOutcome {
        match self.route(&query.text, history).await {
            Ok(answer) => ChatOutcome::success(answer),
            Err(err) => {
                match &err {
                    PipelineError::ScopeRejected => {
                        tracing::info!("Query not routed to a workflow: {}", err)
                    }
                    _ => tracing::warn!("Query failed: {}", err),
                }
                ChatOutcome::error(err.user_message())
            }
        }
    }

    async fn route(&self, text: &str, history: &[ChatMessage]) -> Result<String, PipelineError> {
        if !is_in_scope(text) {
            return Err(PipelineError::ScopeRejected);
        }

        let classification = self.classifier.classify_with_entities(text).await;
        let intent = classification.intent;
        if matches!(intent, Intent::General | Intent::OutOfScope) {
            return Err(PipelineError::ScopeRejected);
        }

        let entities = self
            .extractor
            .extract_for(intent, text, &classification.entities)
            .await;

        match intent {
            Intent::Troubleshoot => self.troubleshoot(text, &entities, history).await,
            Intent::Installation => self.installation(text, &entities, history).await,
            Intent::Compatibility => self.compatibility(text, &entities, history).await,
            Intent::Qna => self.qna(text, &entities, history).await,
            Intent::General | Intent::OutOfScope => Err(PipelineError::ScopeRejected),
        }
    }

    async fn troubleshoot(
        &self,
        text: &str,
        entities: &EntitySet,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let symptom = entities
            .symptom
            .as_deref()
            .ok_or(PipelineError::MissingEntity(MissingField::Symptom))?;

        let pages = self.locator.find_symptom_pages(symptom, entities).await;
        if pages.is_empty() {
            return Err(PipelineError::LocatorMiss(LocatorTarget::SymptomPages(
                symptom.to_string(),
            )));
        }

        let mut last_error = PipelineError::RetrievalFailure(Intent::Troubleshoot);
        let mut evidence = None;
        for url in pages.iter().take(MAX_SYMPTOM_PAGES) {
            match self
                .retriever
                .retrieve_for(Intent::Troubleshoot, url, PageShape::Symptom)
                .await
            {
                Ok(document) if select_top_part(&document.common_parts).is_some() => {
                    evidence = Some(document);
                    break;
                }
                Ok(_) => tracing::info!("Symptom page {} lists no parts with stories", url),
                Err(err) => last_error = err,
            }
        }
        let document = evidence.ok_or(last_error)?;
        let document = self.stamp_model(document, entities);

        self.write_evidence(&document).await;
        let hits = self
            .search_evidence(text, Intent::Troubleshoot, entities.model_number.as_deref())
            .await;

        self.composer
            .troubleshoot(text, symptom, entities, &document, &hits, history)
            .await
    }

    async fn installation(
        &self,
        text: &str,
        entities: &EntitySet,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let part = entities
            .part_number
            .as_deref()
            .ok_or(PipelineError::MissingEntity(MissingField::InstallPart))?;

        let url = self
            .locator
            .find_installation_page(part)
            .await
            .ok_or_else(|| PipelineError::LocatorMiss(LocatorTarget::Part(part.to_string())))?;

        let document = self
            .retriever
            .retrieve_for(Intent::Installation, &url, PageShape::Product)
            .await?;
        let document = self.stamp_model(document, entities);

        self.write_evidence(&document).await;
        let hits = self
            .search_evidence(text, Intent::Installation, entities.model_number.as_deref())
            .await;

        self.composer
            .installation(text, part, entities, &document, &hits, history)
            .await
    }

    async fn compatibility(
        &self,
        text: &str,
        entities: &EntitySet,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        if entities.model_number.is_none() && entities.brand.is_none() {
            return Err(PipelineError::MissingEntity(MissingField::ModelOrBrand));
        }
        let part = entities
            .part_number
            .as_deref()
            .ok_or(PipelineError::MissingEntity(MissingField::CompatibilityPart))?;

        let url = match entities.model_number.as_deref() {
            Some(model) => self
                .locator
                .find_compatibility_page(model, part)
                .await
                .ok_or_else(|| PipelineError::LocatorMiss(LocatorTarget::Model(model.to_string())))?,
            // Brand alone cannot pick a model page; the part page carries the
            // compatibility table.
            None => self
                .locator
                .find_product_url_by_part(part)
                .await
                .ok_or_else(|| PipelineError::LocatorMiss(LocatorTarget::Part(part.to_string())))?,
        };

        let document = self
            .retriever
            .retrieve_for(Intent::Compatibility, &url, PageShape::Product)
            .await?;
        let document = self.stamp_model(document, entities);

        self.write_evidence(&document).await;
        let hits = self
            .search_evidence(text, Intent::Compatibility, entities.model_number.as_deref())
            .await;

        self.composer
            .compatibility(text, part, entities, &document, &hits, history)
            .await
    }

    async fn qna(
        &self,
        text: &str,
        entities: &EntitySet,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let part = entities.part_number.as_deref();
        let model = entities.model_number.as_deref();
        if part.is_none() && model.is_none() {
            return Err(PipelineError::MissingEntity(MissingField::PartOrModel));
        }

        let mut url = None;
        if let Some(part) = part {
            url = self.locator.find_product_url_by_part(part).await;
        }
        if url.is_none() {
            if let Some(model) = model {
                url = self.locator.find_product_url_by_model(model).await;
            }
        }
        let url = url.ok_or_else(|| {
            PipelineError::LocatorMiss(match (part, model) {
                (Some(part), _) => LocatorTarget::Part(part.to_string()),
                (None, model) => LocatorTarget::Model(model.unwrap_or_default().to_string()),
            })
        })?;

        let document = self
            .retriever
            .retrieve_for(Intent::Qna, &url, PageShape::Product)
            .await?;
        let document = self.stamp_model(document, entities);

        let written = self.write_evidence(&document).await;
        let hits = self.search_evidence(text, Intent::Qna, None).await;

        if hits.fragments().is_empty()
            && document.qna_pairs.is_empty()
            && document.description.trim().is_empty()
        {
            let reason = match (written, &hits) {
                (IndexWrite::Failed(reason), _) => reason,
                (_, IndexHits::Failed(reason)) => reason.clone(),
                _ => "no indexed answers and nothing on the page".to_string(),
            };
            return Err(PipelineError::IndexFailure(reason));
        }

        self.composer
            .qna(text, entities, &document, &hits, history)
            .await
    }

    /// Tags an untagged document with the query's model so model-filtered
    /// lookups can find its fragments.
    fn stamp_model(&self, mut document: EvidenceDocument, entities: &EntitySet) -> EvidenceDocument {
        if document.model_number.is_none() {
            document.model_number = entities.model_number.clone();
        }
        document
    }

    async fn write_evidence(&self, document: &EvidenceDocument) -> IndexWrite {
        let written = self.index.write(document).await;
        if let IndexWrite::Failed(reason) = &written {
            tracing::warn!("Continuing without indexing: {}", reason);
        }
        written
    }

    async fn search_evidence(&self, text: &str, intent: Intent, model: Option<&str>) -> IndexHits {
        let hits = self
            .index
            .query(text, intent, model, self.index.default_top_k())
            .await;
        match &hits {
            IndexHits::Found(found) => tracing::info!("Index returned {} fragments", found.len()),
            IndexHits::NoResults => tracing::info!("No relevant indexed fragments"),
            IndexHits::Failed(reason) => tracing::warn!("Index lookup failed: {}", reason),
        }
        hits
    }
}
