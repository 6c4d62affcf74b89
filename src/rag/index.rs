use std::sync::Arc;

use super::engine::FragmentEngine;
use super::store::{FragmentCategory, FragmentFilter, FragmentStore, ScoredFragment};
use crate::assistant::types::Intent;
use crate::llm::LlmService;
use crate::scrape::types::EvidenceDocument;

const EMBED_BATCH_SIZE: usize = 64;

/// Result of writing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexWrite {
    Indexed(usize),
    NothingToIndex,
    Failed(String),
}

/// Result of a filtered similarity query.
#[derive(Debug, Clone)]
pub enum IndexHits {
    Found(Vec<ScoredFragment>),
    NoResults,
    Failed(String),
}

impl IndexHits {
    pub fn fragments(&self) -> &[ScoredFragment] {
        match self {
            IndexHits::Found(hits) => hits,
            IndexHits::NoResults | IndexHits::Failed(_) => &[],
        }
    }
}

/// Category each intent is allowed to read from.
pub fn category_for_intent(intent: Intent) -> Option<FragmentCategory> {
    match intent {
        Intent::Troubleshoot => Some(FragmentCategory::UserStory),
        Intent::Installation => Some(FragmentCategory::InstallationGuides),
        Intent::Compatibility => Some(FragmentCategory::ModelCompatibility),
        Intent::Qna => Some(FragmentCategory::Qna),
        Intent::General | Intent::OutOfScope => None,
    }
}

/// The process-wide semantic index. Built once at startup and shared.
///
/// Append-only: writing the same document twice stores its fragments twice.
pub struct SemanticIndex {
    store: Arc<dyn FragmentStore>,
    llm: LlmService,
    engine: FragmentEngine,
    default_top_k: usize,
}

impl SemanticIndex {
    pub fn new(
        store: Arc<dyn FragmentStore>,
        llm: LlmService,
        chunk_size: usize,
        default_top_k: usize,
    ) -> Self {
        Self {
            store,
            llm,
            engine: FragmentEngine::new(chunk_size),
            default_top_k: default_top_k.max(1),
        }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub async fn fragment_count(&self) -> usize {
        match self.store.count().await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!("Fragment count unavailable: {}", err);
                0
            }
        }
    }

    pub async fn write(&self, document: &EvidenceDocument) -> IndexWrite {
        let fragments = self.engine.decompose(document);
        if fragments.is_empty() {
            tracing::debug!("Document produced no fragments");
            return IndexWrite::NothingToIndex;
        }

        let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            match self.llm.embed(batch).await {
                Ok(batch_vectors) => vectors.extend(batch_vectors),
                Err(err) => {
                    tracing::warn!("Embedding failed while indexing: {}", err);
                    return IndexWrite::Failed(format!("Error creating embeddings: {}", err));
                }
            }
        }

        let items = fragments.into_iter().zip(vectors).collect();
        match self.store.insert_batch(items).await {
            Ok(count) => {
                tracing::info!("Indexed {} fragments", count);
                IndexWrite::Indexed(count)
            }
            Err(err) => {
                tracing::warn!("Fragment store rejected batch: {}", err);
                IndexWrite::Failed(format!("Error storing fragments: {}", err))
            }
        }
    }

    pub async fn query(
        &self,
        text: &str,
        intent: Intent,
        model_number: Option<&str>,
        top_k: usize,
    ) -> IndexHits {
        let filter = FragmentFilter {
            category: category_for_intent(intent),
            model_number: model_number
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        };

        let query_vector = match self.llm.embed(&[text.to_string()]).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.remove(0),
            Ok(_) => return IndexHits::Failed("Embedding provider returned nothing".to_string()),
            Err(err) => {
                tracing::warn!("Query embedding failed: {}", err);
                return IndexHits::Failed(format!("Error during search: {}", err));
            }
        };

        match self.store.search(&query_vector, top_k.max(1), &filter).await {
            Ok(hits) if hits.is_empty() => {
                tracing::debug!(
                    "No fragments for intent {} (model filter {:?})",
                    intent.as_str(),
                    filter.model_number
                );
                IndexHits::NoResults
            }
            Ok(hits) => IndexHits::Found(hits),
            Err(err) => {
                tracing::warn!("Similarity search failed: {}", err);
                IndexHits::Failed(format!("Error during search: {}", err))
            }
        }
    }
}
