use serde_json::Value;

use super::prompts;
use super::types::{ApplianceType, EntitySet, Intent};
use crate::core::config::ClassifierStrategy;
use crate::llm::{strip_code_fences, LlmService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// Entity hints; only the structured strategy fills these.
    pub entities: EntitySet,
}

impl Classification {
    /// The safe default: `general` with every entity unset.
    pub fn fallback() -> Self {
        Self {
            intent: Intent::General,
            entities: EntitySet::default(),
        }
    }
}

/// Labels a query with one intent. Never fails: anything unexpected from the
/// LLM becomes `general`.
pub struct IntentClassifier {
    llm: LlmService,
    strategy: ClassifierStrategy,
}

impl IntentClassifier {
    pub fn new(llm: LlmService, strategy: ClassifierStrategy) -> Self {
        Self { llm, strategy }
    }

    pub async fn classify(&self, query: &str) -> Intent {
        self.classify_with_entities(query).await.intent
    }

    pub async fn classify_with_entities(&self, query: &str) -> Classification {
        let classification = match self.strategy {
            ClassifierStrategy::SingleLabel => Classification {
                intent: self.single_label(query).await,
                entities: EntitySet::default(),
            },
            ClassifierStrategy::Structured => self.structured(query).await,
        };
        tracing::info!("Detected intent: {}", classification.intent.as_str());
        classification
    }

    async fn single_label(&self, query: &str) -> Intent {
        match self.llm.complete(prompts::SINGLE_LABEL_CLASSIFIER, query).await {
            Ok(answer) => parse_label(&answer),
            Err(err) => {
                tracing::warn!("Intent classification failed, defaulting to general: {}", err);
                Intent::General
            }
        }
    }

    async fn structured(&self, query: &str) -> Classification {
        match self.llm.complete(prompts::STRUCTURED_CLASSIFIER, query).await {
            Ok(answer) => parse_structured(&answer),
            Err(err) => {
                tracing::warn!("Intent classification failed, defaulting to general: {}", err);
                Classification::fallback()
            }
        }
    }
}

pub fn parse_label(answer: &str) -> Intent {
    Intent::from_label(strip_code_fences(answer)).unwrap_or_else(|| {
        tracing::warn!("Unexpected intent label {:?}; defaulting to general", answer);
        Intent::General
    })
}

pub fn parse_structured(answer: &str) -> Classification {
    let body = strip_code_fences(answer);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("Classifier returned invalid JSON ({}); defaulting to general", err);
            return Classification::fallback();
        }
    };

    let Some(intent) = value
        .get("intent")
        .and_then(|v| v.as_str())
        .and_then(Intent::from_label)
    else {
        tracing::warn!("Classifier JSON had no valid intent; defaulting to general");
        return Classification::fallback();
    };

    let entities = EntitySet {
        model_number: entity_field(&value, "model_number"),
        part_number: entity_field(&value, "part_number"),
        brand: entity_field(&value, "brand"),
        symptom: entity_field(&value, "symptom"),
        appliance_type: entity_field(&value, "appliance_type")
            .and_then(|t| ApplianceType::from_label(&t)),
    };

    Classification { intent, entities }
}

fn entity_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| {
            !v.is_empty() && !v.eq_ignore_ascii_case("null") && !v.eq_ignore_ascii_case("none")
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stub_llm, StubLlm};

    #[test]
    fn structured_answer_in_code_fence() {
        let answer = "```json\n{\"intent\": \"compatibility\", \"model_number\": \"WDT780SAEM1\", \
                      \"part_number\": \"PS11752778\", \"brand\": null, \"symptom\": \"None\", \
                      \"appliance_type\": \"dishwasher\"}\n```";
        let parsed = parse_structured(answer);

        assert_eq!(parsed.intent, Intent::Compatibility);
        assert_eq!(parsed.entities.model_number.as_deref(), Some("WDT780SAEM1"));
        assert_eq!(parsed.entities.part_number.as_deref(), Some("PS11752778"));
        assert_eq!(parsed.entities.brand, None);
        assert_eq!(parsed.entities.symptom, None);
        assert_eq!(parsed.entities.appliance_type, Some(ApplianceType::Dishwasher));
    }

    #[test]
    fn malformed_or_unknown_answers_fall_back() {
        assert_eq!(parse_structured("I think it's troubleshooting"), Classification::fallback());
        assert_eq!(
            parse_structured("{\"intent\": \"recipes\", \"brand\": \"GE\"}"),
            Classification::fallback()
        );
        assert_eq!(parse_label("Sure! The category is: cooking"), Intent::General);
    }

    #[tokio::test]
    async fn single_label_strategy_reads_one_token() {
        let stub = StubLlm::new().reply_when("Classify the user's query", "Installation\n");
        let classifier =
            IntentClassifier::new(stub_llm(stub.clone()), ClassifierStrategy::SingleLabel);

        let classification = classifier.classify_with_entities("How do I install PS11752778?").await;

        assert_eq!(classification.intent, Intent::Installation);
        assert_eq!(classification.entities, EntitySet::default());
        assert_eq!(stub.chat_calls().len(), 1);
    }

    #[tokio::test]
    async fn llm_failure_defaults_to_general() {
        let classifier = IntentClassifier::new(
            stub_llm(StubLlm::new().failing_chat()),
            ClassifierStrategy::Structured,
        );
        assert_eq!(classifier.classify("my fridge is loud").await, Intent::General);
    }
}
