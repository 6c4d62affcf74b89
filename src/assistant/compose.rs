//! Bounded context assembly and final answer generation.

use serde::Serialize;

use super::error::PipelineError;
use super::prompts;
use super::types::{EntitySet, Intent};
use crate::llm::{ChatMessage, LlmService};
use crate::rag::IndexHits;
use crate::scrape::types::{CompatibilityEntry, EvidenceDocument, PartRecord};

const MAX_STORIES: usize = 3;
const MAX_HITS: usize = 5;
const MAX_LIST_ITEMS: usize = 5;
const MAX_COMPATIBILITY_ROWS: usize = 10;
const MAX_DESCRIPTION_CHARS: usize = 1_000;
const MAX_INSTRUCTION_CHARS: usize = 800;
const MAX_GUIDE_CHARS: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityVerdict {
    Listed,
    NotListed,
    Unknown,
}

#[derive(Debug, Serialize)]
struct StoryExcerpt {
    title: String,
    instruction: String,
}

#[derive(Debug, Serialize)]
struct TroubleshootContext<'a> {
    symptom: &'a str,
    model_number: Option<&'a str>,
    brand: Option<&'a str>,
    symptom_title: &'a str,
    diagnosis_steps: Vec<String>,
    part_name: &'a str,
    part_number: &'a str,
    price: &'a str,
    fix_percentage: u8,
    description: String,
    user_stories: Vec<StoryExcerpt>,
    related_stories: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InstallationContext<'a> {
    part_number: &'a str,
    model_number: Option<&'a str>,
    part_name: &'a str,
    price: &'a str,
    description: String,
    installation_info: String,
    fixes_symptoms: Vec<&'a str>,
    replaces: Vec<&'a str>,
    guide_excerpts: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CompatibilityContext<'a> {
    model_number: Option<&'a str>,
    brand: Option<&'a str>,
    part_number: &'a str,
    part_name: &'a str,
    price: &'a str,
    verdict: CompatibilityVerdict,
    matching_models: Vec<&'a CompatibilityEntry>,
    listed_model_count: usize,
    related_entries: Vec<String>,
}

#[derive(Debug, Serialize)]
struct QnaContext<'a> {
    part_number: Option<&'a str>,
    model_number: Option<&'a str>,
    part_name: &'a str,
    price: &'a str,
    description: String,
    relevant_qna: Vec<String>,
    page_qna: Vec<String>,
}

/// Most likely fix: highest fix percentage among parts with at least one
/// user story. Ties go to the earlier part.
pub fn select_top_part(parts: &[PartRecord]) -> Option<&PartRecord> {
    parts
        .iter()
        .filter(|part| !part.user_stories.is_empty())
        .fold(None, |best: Option<&PartRecord>, part| match best {
            Some(current) if current.fix_percentage >= part.fix_percentage => Some(current),
            _ => Some(part),
        })
}

/// Looks `model_number` up in the page's compatibility table.
pub fn compatibility_verdict(
    document: &EvidenceDocument,
    model_number: Option<&str>,
) -> CompatibilityVerdict {
    let Some(model) = model_number.map(str::trim).filter(|m| !m.is_empty()) else {
        return CompatibilityVerdict::Unknown;
    };
    if document.compatibility_list.is_empty() {
        return CompatibilityVerdict::Unknown;
    }
    if document
        .compatibility_list
        .iter()
        .any(|entry| entry.model_number.trim().eq_ignore_ascii_case(model))
    {
        CompatibilityVerdict::Listed
    } else {
        CompatibilityVerdict::NotListed
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

fn hit_texts(hits: &IndexHits) -> Vec<String> {
    hits.fragments()
        .iter()
        .take(MAX_HITS)
        .map(|hit| hit.fragment.text.clone())
        .collect()
}

fn first_items(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect()
}

pub struct ResponseComposer {
    llm: LlmService,
}

impl ResponseComposer {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    pub async fn troubleshoot(
        &self,
        query: &str,
        symptom: &str,
        entities: &EntitySet,
        document: &EvidenceDocument,
        hits: &IndexHits,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let Some(part) = select_top_part(&document.common_parts) else {
            tracing::warn!("No common parts with user stories on symptom page");
            return Err(PipelineError::RetrievalFailure(Intent::Troubleshoot));
        };

        let context = TroubleshootContext {
            symptom,
            model_number: entities.model_number.as_deref(),
            brand: entities.brand.as_deref(),
            symptom_title: document.symptom_title.trim(),
            diagnosis_steps: first_items(&document.diagnosis_steps)
                .into_iter()
                .map(str::to_string)
                .collect(),
            part_name: part.part_name.trim(),
            part_number: part.part_number.trim(),
            price: part.price.trim(),
            fix_percentage: part.fix_percentage,
            description: truncate(&part.description, MAX_DESCRIPTION_CHARS),
            user_stories: part
                .user_stories
                .iter()
                .take(MAX_STORIES)
                .map(|story| StoryExcerpt {
                    title: story.title.trim().to_string(),
                    instruction: truncate(&story.instruction, MAX_INSTRUCTION_CHARS),
                })
                .collect(),
            related_stories: hit_texts(hits),
        };

        let mut answer = self
            .generate(Intent::Troubleshoot, query, &context, history)
            .await?;

        if let Some(url) = part.part_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            answer.push_str(&format!("\n\n**[View {} on PartSelect]({})**", context.part_name, url));
        }
        Ok(answer)
    }

    pub async fn installation(
        &self,
        query: &str,
        part_number: &str,
        entities: &EntitySet,
        document: &EvidenceDocument,
        hits: &IndexHits,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let context = InstallationContext {
            part_number,
            model_number: entities.model_number.as_deref(),
            part_name: document.part_name.trim(),
            price: document.price.trim(),
            description: truncate(&document.description, MAX_DESCRIPTION_CHARS),
            installation_info: truncate(&document.installation_info, MAX_GUIDE_CHARS),
            fixes_symptoms: first_items(&document.symptoms),
            replaces: first_items(&document.replacements),
            guide_excerpts: hit_texts(hits),
        };
        self.generate(Intent::Installation, query, &context, history)
            .await
    }

    pub async fn compatibility(
        &self,
        query: &str,
        part_number: &str,
        entities: &EntitySet,
        document: &EvidenceDocument,
        hits: &IndexHits,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let model = entities.model_number.as_deref();
        let verdict = compatibility_verdict(document, model);
        tracing::info!("Compatibility verdict for {:?}: {:?}", model, verdict);

        let matching_models: Vec<&CompatibilityEntry> = document
            .compatibility_list
            .iter()
            .filter(|entry| match (model, entities.brand.as_deref()) {
                (Some(m), _) => entry.model_number.trim().eq_ignore_ascii_case(m.trim()),
                (None, Some(b)) => entry.brand.trim().eq_ignore_ascii_case(b.trim()),
                (None, None) => false,
            })
            .take(MAX_COMPATIBILITY_ROWS)
            .collect();

        let context = CompatibilityContext {
            model_number: model,
            brand: entities.brand.as_deref(),
            part_number,
            part_name: document.part_name.trim(),
            price: document.price.trim(),
            verdict,
            matching_models,
            listed_model_count: document.compatibility_list.len(),
            related_entries: hit_texts(hits),
        };
        self.generate(Intent::Compatibility, query, &context, history)
            .await
    }

    pub async fn qna(
        &self,
        query: &str,
        entities: &EntitySet,
        document: &EvidenceDocument,
        hits: &IndexHits,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let context = QnaContext {
            part_number: entities.part_number.as_deref(),
            model_number: entities.model_number.as_deref(),
            part_name: document.part_name.trim(),
            price: document.price.trim(),
            description: truncate(&document.description, MAX_DESCRIPTION_CHARS),
            relevant_qna: hit_texts(hits),
            page_qna: document
                .qna_pairs
                .iter()
                .take(MAX_LIST_ITEMS)
                .map(|pair| format!("Q: {}\nA: {}", pair.question.trim(), pair.answer.trim()))
                .collect(),
        };
        self.generate(Intent::Qna, query, &context, history).await
    }

    async fn generate<C: Serialize>(
        &self,
        intent: Intent,
        query: &str,
        context: &C,
        history: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let context_json =
            serde_json::to_string_pretty(context).map_err(|err| PipelineError::GenerationFailure {
                intent,
                reason: err.to_string(),
            })?;

        let system_prompt = prompts::composer_system_prompt(intent);
        let user_prompt = prompts::composer_user_prompt(intent, query, &context_json);

        tracing::info!("Generating {} response", intent.as_str());
        let answer = self
            .llm
            .complete_with_history(&system_prompt, history, &user_prompt)
            .await
            .map_err(|err| {
                tracing::error!("Response generation failed: {}", err);
                PipelineError::from_generation(intent, err)
            })?;

        if answer.is_empty() {
            tracing::error!("Response generation returned an empty answer");
            return Err(PipelineError::GenerationFailure {
                intent,
                reason: "empty answer".to_string(),
            });
        }
        Ok(answer)
    }
}
