//! Storage seam for the semantic index.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentCategory {
    Qna,
    TroubleshootingSymptoms,
    TroubleshootingProducts,
    TroubleshootingReplacements,
    ModelCompatibility,
    InstallationGuides,
    FullDescriptionChunk,
    PartInfo,
    UserStory,
}

impl FragmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentCategory::Qna => "qna",
            FragmentCategory::TroubleshootingSymptoms => "troubleshooting_symptoms",
            FragmentCategory::TroubleshootingProducts => "troubleshooting_products",
            FragmentCategory::TroubleshootingReplacements => "troubleshooting_replacements",
            FragmentCategory::ModelCompatibility => "model_compatibility",
            FragmentCategory::InstallationGuides => "installation_guides",
            FragmentCategory::FullDescriptionChunk => "full_description_chunk",
            FragmentCategory::PartInfo => "part_info",
            FragmentCategory::UserStory => "user_story",
        }
    }
}

/// A unit of indexed text. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFragment {
    pub text: String,
    pub category: FragmentCategory,
    pub model_number: Option<String>,
    /// Origin URL, or "scraped_json" when the document had none.
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct ScoredFragment {
    pub fragment: IndexedFragment,
    /// Cosine similarity, higher is closer.
    pub score: f32,
}

/// Predicate applied before similarity ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentFilter {
    pub category: Option<FragmentCategory>,
    pub model_number: Option<String>,
}

impl FragmentFilter {
    pub fn matches(&self, fragment: &IndexedFragment) -> bool {
        if let Some(category) = self.category {
            if fragment.category != category {
                return false;
            }
        }
        match (&self.model_number, &fragment.model_number) {
            (None, _) => true,
            (Some(wanted), Some(tag)) => wanted.trim().eq_ignore_ascii_case(tag.trim()),
            (Some(_), None) => false,
        }
    }
}

#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Appends a batch. Readers see either none or all of it.
    async fn insert_batch(
        &self,
        items: Vec<(IndexedFragment, Vec<f32>)>,
    ) -> Result<usize, ApiError>;

    /// Nearest-first fragments passing `filter`, at most `limit`.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &FragmentFilter,
    ) -> Result<Vec<ScoredFragment>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;
}
