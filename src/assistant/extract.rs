//! Entity extraction: deterministic patterns first, LLM only for the long tail.

use std::sync::LazyLock;

use regex::Regex;

use super::prompts;
use super::types::{ApplianceType, EntitySet, Intent};
use crate::llm::LlmService;

// Priority order matters: the first pattern with an acceptable match wins.
static MODEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b[A-Z]{2,}\d{2,}[A-Z0-9]+\b",
        r"\b[A-Z]+\d{4,}[A-Z]*\d*\b",
        r"\b\d{1,2}-?[A-Z]{1,2}\d{3,}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PART_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bPS\d{5,}\b",
        r"\bW10\d{5,}\b",
        r"\bWP\d{5,}\b",
        r"\b[A-Z]{2}\d{6,}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Shorter tokens are treated as part numbers or noise.
const MIN_MODEL_LEN: usize = 8;

const BRANDS: &[(&str, &str)] = &[
    (r"(?i)\bwhirlpool\b", "Whirlpool"),
    (r"(?i)\bkitchen\s?aid\b", "KitchenAid"),
    (r"(?i)\bfrigidaire\b", "Frigidaire"),
    (r"(?i)\bsamsung\b", "Samsung"),
    (r"(?i)\bmaytag\b", "Maytag"),
    (r"(?i)\bbosch\b", "Bosch"),
    (r"(?i)\bkenmore\b", "Kenmore"),
    (r"(?i)\bamana\b", "Amana"),
    (r"(?i)\belectrolux\b", "Electrolux"),
    (r"(?i)\bjenn-?air\b", "Jenn-Air"),
    (r"(?i)\bhotpoint\b", "Hotpoint"),
    (r"(?i)\bhaier\b", "Haier"),
    (r"(?i)\bgeneral electric\b", "GE"),
    // Two-letter brands only match in capitals.
    (r"\bGE\b", "GE"),
    (r"\bLG\b", "LG"),
];

static BRAND_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    BRANDS
        .iter()
        .map(|(pattern, name)| (Regex::new(pattern).unwrap(), *name))
        .collect()
});

static SYMPTOM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b((?:not|isn'?t|won'?t|will not|doesn'?t|does not|stopped|no longer)\s+(?:making|make|dispensing|dispense|draining|drain|cooling|cool|cleaning|clean|drying|dry|starting|start|filling|fill|working|work|running|run|closing|close|freezing|freeze|spinning|spin|latching|latch|turning on|turn on|getting cold|get cold)(?:\s+(?:ice|water|dishes|cold|properly|at all))?)\b",
        r"(?i)\b(leaking(?:\s+water)?|too\s+(?:warm|cold)|(?:making\s+(?:a\s+)?(?:loud\s+)?noise|noisy)|(?:frost|ice)\s+build-?up|door\s+(?:won'?t|will not)\s+close|(?:bad|strange)\s+smell|(?:lights?|display)\s+not\s+working)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn match_part_number(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    PART_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(&upper).map(|m| m.as_str().to_string()))
}

/// Model-number candidates skip anything that is also part-number shaped, so a
/// query naming both yields each in its own slot.
pub fn match_model_number(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    MODEL_PATTERNS.iter().find_map(|pattern| {
        pattern
            .find_iter(&upper)
            .map(|m| m.as_str())
            .find(|candidate| candidate.len() >= MIN_MODEL_LEN && !is_part_shaped(candidate))
            .map(str::to_string)
    })
}

pub fn match_brand(text: &str) -> Option<String> {
    BRAND_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, name)| name.to_string())
}

pub fn match_symptom(text: &str) -> Option<String> {
    SYMPTOM_PATTERNS.iter().find_map(|pattern| {
        pattern.captures(text).and_then(|caps| caps.get(1)).map(|m| {
            WHITESPACE
                .replace_all(m.as_str().trim(), " ")
                .to_lowercase()
        })
    })
}

pub fn detect_appliance_type(text: &str) -> Option<ApplianceType> {
    let lower = text.to_lowercase();
    if lower.contains("dishwasher") {
        return Some(ApplianceType::Dishwasher);
    }
    if ["fridge", "refrigerator", "freezer", "ice maker", "icemaker"]
        .iter()
        .any(|word| lower.contains(word))
    {
        return Some(ApplianceType::Refrigerator);
    }
    None
}

fn is_part_shaped(token: &str) -> bool {
    PART_PATTERNS.iter().any(|pattern| {
        pattern
            .find(token)
            .is_some_and(|m| m.start() == 0 && m.end() == token.len())
    })
}

/// Normalises a fallback answer; "none" in any casing means nothing found.
fn clean_llm_answer(raw: &str) -> Option<String> {
    let value = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
        .trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("null")
    {
        return None;
    }
    Some(value.to_string())
}

pub struct EntityExtractor {
    llm: LlmService,
}

impl EntityExtractor {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    pub async fn extract_model_number(&self, query: &str) -> Option<String> {
        if let Some(model) = match_model_number(query) {
            tracing::debug!("Model number via pattern: {}", model);
            return Some(model);
        }
        self.ask("model number", prompts::EXTRACT_MODEL, query).await
    }

    pub async fn extract_part_number(&self, query: &str) -> Option<String> {
        if let Some(part) = match_part_number(query) {
            tracing::debug!("Part number via pattern: {}", part);
            return Some(part);
        }
        self.ask("part number", prompts::EXTRACT_PART, query).await
    }

    pub async fn extract_brand(&self, query: &str) -> Option<String> {
        if let Some(brand) = match_brand(query) {
            return Some(brand);
        }
        self.ask("brand", prompts::EXTRACT_BRAND, query).await
    }

    pub async fn extract_symptom(&self, query: &str) -> Option<String> {
        if let Some(symptom) = match_symptom(query) {
            tracing::debug!("Symptom via pattern: {}", symptom);
            return Some(symptom);
        }
        self.ask("symptom", prompts::EXTRACT_SYMPTOM, query).await
    }

    /// Fills the fields `intent` needs. Pattern matches beat `hints` (from a
    /// structured classifier), which beat a dedicated LLM call.
    pub async fn extract_for(&self, intent: Intent, query: &str, hints: &EntitySet) -> EntitySet {
        let mut entities = EntitySet {
            appliance_type: detect_appliance_type(query).or(hints.appliance_type),
            ..EntitySet::default()
        };

        entities.model_number = match match_model_number(query).or_else(|| hints.model_number.clone()) {
            Some(model) => Some(model),
            None => self.ask("model number", prompts::EXTRACT_MODEL, query).await,
        };

        if entities.model_number.is_none() {
            entities.brand = match match_brand(query).or_else(|| hints.brand.clone()) {
                Some(brand) => Some(brand),
                None => self.ask("brand", prompts::EXTRACT_BRAND, query).await,
            };
        }

        if matches!(
            intent,
            Intent::Installation | Intent::Compatibility | Intent::Qna
        ) {
            entities.part_number = match match_part_number(query).or_else(|| hints.part_number.clone()) {
                Some(part) => Some(part),
                None => self.ask("part number", prompts::EXTRACT_PART, query).await,
            };
        }

        if intent == Intent::Troubleshoot {
            entities.symptom = match match_symptom(query).or_else(|| hints.symptom.clone()) {
                Some(symptom) => Some(symptom),
                None => self.ask("symptom", prompts::EXTRACT_SYMPTOM, query).await,
            };
        }

        tracing::info!(
            "Entities: model={:?} part={:?} brand={:?} symptom={:?} appliance={:?}",
            entities.model_number,
            entities.part_number,
            entities.brand,
            entities.symptom,
            entities.appliance_type.map(|a| a.as_str())
        );
        entities
    }

    async fn ask(&self, what: &str, system_prompt: &str, query: &str) -> Option<String> {
        match self.llm.complete(system_prompt, query).await {
            Ok(answer) => {
                let value = clean_llm_answer(&answer);
                tracing::debug!("{} via LLM fallback: {:?}", what, value);
                value
            }
            Err(err) => {
                tracing::warn!("LLM fallback for {} failed: {}", what, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stub_llm, StubLlm};

    #[test]
    fn model_and_part_patterns_do_not_collide() {
        let text = "Is PS11752778 compatible with my WDT780SAEM1 dishwasher?";
        assert_eq!(match_part_number(text).as_deref(), Some("PS11752778"));
        assert_eq!(match_model_number(text).as_deref(), Some("WDT780SAEM1"));
    }

    #[test]
    fn model_pattern_boundaries() {
        assert_eq!(
            match_model_number("my fridge model wrs588fihz00 is broken").as_deref(),
            Some("WRS588FIHZ00")
        );
        // Too short for a model number.
        assert_eq!(match_model_number("WRS588F"), None);
        // W10 part numbers are not models even though they are long enough.
        assert_eq!(match_model_number("I have W10321304"), None);
        assert_eq!(match_model_number("hello there"), None);
    }

    #[test]
    fn first_occurrence_wins_within_a_pattern() {
        assert_eq!(
            match_model_number("WRS588FIHZ00 or GSS25GSHSS").as_deref(),
            Some("WRS588FIHZ00")
        );
        assert_eq!(
            match_part_number("WP12345678 then PS11752778").as_deref(),
            Some("PS11752778"),
            "PS pattern has priority over WP"
        );
    }

    #[test]
    fn brand_matching_is_canonical() {
        assert_eq!(match_brand("my whirlpool fridge").as_deref(), Some("Whirlpool"));
        assert_eq!(match_brand("a Kitchen Aid unit").as_deref(), Some("KitchenAid"));
        assert_eq!(match_brand("My GE dishwasher").as_deref(), Some("GE"));
        assert_eq!(match_brand("get it going"), None);
    }

    #[test]
    fn symptom_phrases() {
        assert_eq!(
            match_symptom("My Whirlpool fridge model WRS588FIHZ00 is not making ice").as_deref(),
            Some("not making ice")
        );
        assert_eq!(
            match_symptom("the dishwasher   won't   drain").as_deref(),
            Some("won't drain")
        );
        assert_eq!(match_symptom("my dishwasher needs a new rack"), None);
        assert_eq!(
            match_symptom("Dishwasher is leaking water everywhere").as_deref(),
            Some("leaking water")
        );
    }

    #[test]
    fn appliance_type_from_keywords() {
        assert_eq!(detect_appliance_type("ice maker"), Some(ApplianceType::Refrigerator));
        assert_eq!(detect_appliance_type("Dishwasher rack"), Some(ApplianceType::Dishwasher));
        assert_eq!(detect_appliance_type("oven"), None);
    }

    #[tokio::test]
    async fn patterns_win_without_touching_the_llm() {
        let stub = StubLlm::new().failing_chat();
        let extractor = EntityExtractor::new(stub_llm(stub.clone()));
        let text = "Does PS11752778 fit WDT780SAEM1?";

        assert_eq!(extractor.extract_part_number(text).await.as_deref(), Some("PS11752778"));
        assert_eq!(extractor.extract_model_number(text).await.as_deref(), Some("WDT780SAEM1"));
        assert!(stub.chat_calls().is_empty());
    }

    #[tokio::test]
    async fn extraction_is_idempotent() {
        let extractor = EntityExtractor::new(stub_llm(StubLlm::new()));
        let text = "model WRS588FIHZ00";
        let first = extractor.extract_model_number(text).await;
        let second = extractor.extract_model_number(text).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn llm_none_and_errors_mean_not_found() {
        let none = EntityExtractor::new(stub_llm(StubLlm::new().reply_when("model number", "NONE")));
        assert_eq!(none.extract_model_number("my old fridge").await, None);

        let failing = EntityExtractor::new(stub_llm(StubLlm::new().failing_chat()));
        assert_eq!(failing.extract_brand("my old fridge").await, None);
        assert_eq!(failing.extract_symptom("my old fridge").await, None);
    }

    #[tokio::test]
    async fn llm_fallback_answer_is_cleaned() {
        let stub = StubLlm::new().reply_when("model number", " \"GSS25GSHSS\". ");
        let extractor = EntityExtractor::new(stub_llm(stub));
        assert_eq!(
            extractor.extract_model_number("the GE one").await.as_deref(),
            Some("GSS25GSHSS")
        );
    }

    #[tokio::test]
    async fn hints_skip_fallback_calls() {
        let stub = StubLlm::new().failing_chat();
        let extractor = EntityExtractor::new(stub_llm(stub.clone()));
        let hints = EntitySet {
            model_number: Some("GSS25GSHSS".to_string()),
            symptom: Some("ice maker not working".to_string()),
            ..EntitySet::default()
        };

        let entities = extractor
            .extract_for(Intent::Troubleshoot, "my fridge has a problem", &hints)
            .await;

        assert_eq!(entities.model_number.as_deref(), Some("GSS25GSHSS"));
        assert_eq!(entities.symptom.as_deref(), Some("ice maker not working"));
        assert_eq!(entities.appliance_type, Some(ApplianceType::Refrigerator));
        assert_eq!(entities.part_number, None);
        assert!(stub.chat_calls().is_empty());
    }
}
