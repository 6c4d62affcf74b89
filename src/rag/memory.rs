//! Process-local fragment store.
//!
//! Vectors live in one `Vec` behind a tokio `RwLock`; a batch is appended
//! under a single write guard so readers never see half a document. Search is
//! brute-force cosine over the fragments that pass the filter.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{FragmentFilter, FragmentStore, IndexedFragment, ScoredFragment};
use crate::core::errors::ApiError;
use crate::tools::vector_math::rank_descending_by_cosine;

struct StoredFragment {
    fragment: IndexedFragment,
    vector: Vec<f32>,
}

#[derive(Default)]
pub struct InMemoryFragmentStore {
    fragments: RwLock<Vec<StoredFragment>>,
}

impl InMemoryFragmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FragmentStore for InMemoryFragmentStore {
    async fn insert_batch(
        &self,
        items: Vec<(IndexedFragment, Vec<f32>)>,
    ) -> Result<usize, ApiError> {
        if items.iter().any(|(_, vector)| vector.is_empty()) {
            return Err(ApiError::Internal(
                "Refusing to store a fragment without an embedding".to_string(),
            ));
        }

        let count = items.len();
        let mut guard = self.fragments.write().await;
        guard.extend(
            items
                .into_iter()
                .map(|(fragment, vector)| StoredFragment { fragment, vector }),
        );
        Ok(count)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &FragmentFilter,
    ) -> Result<Vec<ScoredFragment>, ApiError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let guard = self.fragments.read().await;
        let candidates: Vec<&StoredFragment> = guard
            .iter()
            .filter(|stored| filter.matches(&stored.fragment))
            .filter(|stored| stored.vector.len() == query_embedding.len())
            .collect();

        let vectors: Vec<&[f32]> = candidates.iter().map(|s| s.vector.as_slice()).collect();
        let ranked = rank_descending_by_cosine(query_embedding, &vectors)?;

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(idx, score)| ScoredFragment {
                fragment: candidates[idx].fragment.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.fragments.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::store::FragmentCategory;
    use std::sync::Arc;

    fn fragment(text: &str, category: FragmentCategory) -> IndexedFragment {
        IndexedFragment {
            text: text.to_string(),
            category,
            model_number: None,
            source: "scraped_json".to_string(),
        }
    }

    #[tokio::test]
    async fn search_orders_nearest_first_and_respects_limit() {
        let store = InMemoryFragmentStore::new();
        store
            .insert_batch(vec![
                (fragment("far", FragmentCategory::Qna), vec![0.0, 1.0]),
                (fragment("near", FragmentCategory::Qna), vec![1.0, 0.1]),
                (fragment("exact", FragmentCategory::Qna), vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store
            .search(&[1.0, 0.0], 2, &FragmentFilter::default())
            .await
            .unwrap();

        let texts: Vec<&str> = hits.iter().map(|h| h.fragment.text.as_str()).collect();
        assert_eq!(texts, vec!["exact", "near"]);
    }

    #[tokio::test]
    async fn filter_is_applied_before_ranking() {
        let store = InMemoryFragmentStore::new();
        store
            .insert_batch(vec![
                (fragment("qna", FragmentCategory::Qna), vec![1.0, 0.0]),
                (fragment("story", FragmentCategory::UserStory), vec![0.5, 0.5]),
            ])
            .await
            .unwrap();

        let filter = FragmentFilter {
            category: Some(FragmentCategory::UserStory),
            model_number: None,
        };
        let hits = store.search(&[1.0, 0.0], 5, &filter).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fragment.text, "story");
    }

    #[tokio::test]
    async fn empty_vectors_reject_the_whole_batch() {
        let store = InMemoryFragmentStore::new();
        let err = store
            .insert_batch(vec![
                (fragment("ok", FragmentCategory::Qna), vec![1.0]),
                (fragment("bad", FragmentCategory::Qna), Vec::new()),
            ])
            .await;

        assert!(err.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_batches_are_never_split() {
        let store = Arc::new(InMemoryFragmentStore::new());
        let mut writers = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            writers.push(tokio::spawn(async move {
                let batch = (0..5)
                    .map(|i| (fragment(&i.to_string(), FragmentCategory::PartInfo), vec![1.0]))
                    .collect();
                store.insert_batch(batch).await.unwrap();
            }));
        }
        for _ in 0..8 {
            let count = store.count().await.unwrap();
            assert_eq!(count % 5, 0);
            tokio::task::yield_now().await;
        }
        for writer in writers {
            writer.await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 40);
    }
}
