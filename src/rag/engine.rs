//! Turns scraped documents into index fragments.

use super::store::{FragmentCategory, IndexedFragment};
use crate::scrape::types::EvidenceDocument;

const SCRAPED_SOURCE: &str = "scraped_json";
const NO_INSTALLATION_INFO: &str = "No installation information available.";

/// Decomposes documents by section into tagged fragments.
#[derive(Debug, Clone)]
pub struct FragmentEngine {
    chunk_size: usize,
}

impl FragmentEngine {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn decompose(&self, doc: &EvidenceDocument) -> Vec<IndexedFragment> {
        let source = doc
            .url
            .clone()
            .unwrap_or_else(|| SCRAPED_SOURCE.to_string());
        let doc_model = doc.model_number.clone();
        let mut out = Vec::new();

        let mut push = |text: String, category: FragmentCategory, model: Option<String>| {
            if !text.trim().is_empty() {
                out.push(IndexedFragment {
                    text,
                    category,
                    model_number: model,
                    source: source.clone(),
                });
            }
        };

        for pair in &doc.qna_pairs {
            let question = pair.question.trim();
            let answer = pair.answer.trim();
            if !question.is_empty() && !answer.is_empty() {
                push(
                    format!("Q: {}\nA: {}", question, answer),
                    FragmentCategory::Qna,
                    doc_model.clone(),
                );
            }
        }

        for (label, items, category) in [
            ("Symptoms", &doc.symptoms, FragmentCategory::TroubleshootingSymptoms),
            ("Products", &doc.products, FragmentCategory::TroubleshootingProducts),
            (
                "Replacements",
                &doc.replacements,
                FragmentCategory::TroubleshootingReplacements,
            ),
        ] {
            let joined = join_non_empty(items);
            if !joined.is_empty() {
                push(format!("{}: {}", label, joined), category, doc_model.clone());
            }
        }

        for entry in &doc.compatibility_list {
            let brand = entry.brand.trim();
            let model = entry.model_number.trim();
            let description = entry.description.trim();
            if !brand.is_empty() && !model.is_empty() && !description.is_empty() {
                push(
                    format!(
                        "Brand: {}\nModel Number: {}\nDescription: {}",
                        brand, model, description
                    ),
                    FragmentCategory::ModelCompatibility,
                    Some(model.to_string()),
                );
            }
        }

        let installation = doc.installation_info.trim();
        if !installation.is_empty() && installation != NO_INSTALLATION_INFO {
            push(
                installation.to_string(),
                FragmentCategory::InstallationGuides,
                doc_model.clone(),
            );
        }

        for chunk in split_into_chunks(&doc.description, self.chunk_size) {
            push(chunk, FragmentCategory::FullDescriptionChunk, doc_model.clone());
        }

        for part in &doc.common_parts {
            push(
                format!(
                    "Part: {}\nFix Percentage: {}%\nPrice: ${}\nDescription: {}",
                    part.part_name.trim(),
                    part.fix_percentage,
                    part.price.trim().trim_start_matches('$'),
                    part.description.trim()
                ),
                FragmentCategory::PartInfo,
                doc_model.clone(),
            );

            for story in &part.user_stories {
                let title = story.title.trim();
                let instruction = story.instruction.trim();
                if title.is_empty() && instruction.is_empty() {
                    continue;
                }
                push(
                    format!("Title: {}\nInstruction: {}", title, instruction),
                    FragmentCategory::UserStory,
                    doc_model.clone(),
                );
            }
        }

        out
    }
}

fn join_non_empty(items: &[String]) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fixed-size character windows, no overlap. Never splits a code point.
fn split_into_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.trim().chars().collect();
    chars
        .chunks(chunk_size.max(1))
        .map(|window| window.iter().collect::<String>().trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
