use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// One row of a product page's model-compatibility table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatibilityEntry {
    pub brand: String,
    pub model_number: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QnaPair {
    pub question: String,
    pub answer: String,
}

/// A repair narrative left by a customer under a part on a symptom page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStory {
    pub title: String,
    pub instruction: String,
    pub author: String,
    pub difficulty: String,
    pub time: String,
    pub tools: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartRecord {
    pub part_name: String,
    pub part_number: String,
    pub manufacturer_part_number: String,
    pub price: String,
    /// Share of customers this part fixed the symptom for, 0-100.
    #[serde(deserialize_with = "lenient_percentage")]
    pub fix_percentage: u8,
    pub description: String,
    pub part_url: Option<String>,
    pub user_stories: Vec<UserStory>,
}

/// Accepts `85`, `85.0`, `"85"` or `"85%"`. Out-of-range values are clamped
/// to 0-100; anything unparseable reads as 0.
fn lenient_percentage<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed
        .filter(|p| p.is_finite())
        .map(|p| p.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0))
}

/// Structured record of a scraped product page or symptom page.
///
/// Product pages fill the description, troubleshooting lists, compatibility
/// table and Q&A. Symptom pages fill `common_parts`, `diagnosis_steps` and the
/// symptom metadata. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceDocument {
    pub url: Option<String>,
    pub part_name: String,
    pub price: String,
    pub brand: String,
    pub description: String,
    pub installation_info: String,
    pub symptoms: Vec<String>,
    pub products: Vec<String>,
    pub replacements: Vec<String>,
    pub compatibility_list: Vec<CompatibilityEntry>,
    pub qna_pairs: Vec<QnaPair>,
    pub common_parts: Vec<PartRecord>,
    pub diagnosis_steps: Vec<String>,
    pub symptom_title: String,
    pub model_number: Option<String>,
    pub video_url: Option<String>,
}

impl EvidenceDocument {
    /// True when the scraper returned a shell with nothing worth indexing.
    pub fn is_empty(&self) -> bool {
        self.part_name.trim().is_empty()
            && self.description.trim().is_empty()
            && self.installation_info.trim().is_empty()
            && self.symptoms.is_empty()
            && self.products.is_empty()
            && self.replacements.is_empty()
            && self.compatibility_list.is_empty()
            && self.qna_pairs.is_empty()
            && self.common_parts.is_empty()
            && self.diagnosis_steps.is_empty()
    }

    /// Clamps percentages and drops blank model tags coming off the wire.
    pub fn normalized(mut self) -> Self {
        for part in &mut self.common_parts {
            part.fix_percentage = part.fix_percentage.min(100);
        }
        self.model_number = self
            .model_number
            .take()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        self.url = self
            .url
            .take()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }
}
