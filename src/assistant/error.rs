use thiserror::Error;

use super::prompts::CAPABILITY_MENU;
use super::types::Intent;
use crate::core::errors::ApiError;

/// Entity a workflow could not proceed without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Symptom,
    InstallPart,
    ModelOrBrand,
    CompatibilityPart,
    PartOrModel,
}

/// What the locator was asked to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorTarget {
    Part(String),
    Model(String),
    SymptomPages(String),
}

impl std::fmt::Display for LocatorTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocatorTarget::Part(part) => write!(f, "part {}", part),
            LocatorTarget::Model(model) => write!(f, "model {}", model),
            LocatorTarget::SymptomPages(symptom) => write!(f, "symptom '{}'", symptom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieve,
    Generate,
}

/// Every way a single query can fail inside the pipeline. Each maps to a
/// user-facing message; none of them reach the HTTP layer as a 500.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("query is outside the appliance domain")]
    ScopeRejected,
    #[error("missing entity: {0:?}")]
    MissingEntity(MissingField),
    #[error("no trusted page found for {0}")]
    LocatorMiss(LocatorTarget),
    #[error("retrieval failed for {} workflow", .0.as_str())]
    RetrievalFailure(Intent),
    #[error("index failure: {0}")]
    IndexFailure(String),
    #[error("generation failed for {} workflow: {reason}", intent.as_str())]
    GenerationFailure { intent: Intent, reason: String },
    #[error("{stage:?} stage timed out for {} workflow", intent.as_str())]
    Timeout { intent: Intent, stage: Stage },
}

impl PipelineError {
    /// Maps a failed answer-generation call, keeping timeouts distinct.
    pub fn from_generation(intent: Intent, err: ApiError) -> Self {
        match err {
            ApiError::Timeout(_) => PipelineError::Timeout {
                intent,
                stage: Stage::Generate,
            },
            other => PipelineError::GenerationFailure {
                intent,
                reason: other.to_string(),
            },
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PipelineError::ScopeRejected => CAPABILITY_MENU.to_string(),
            PipelineError::MissingEntity(field) => missing_message(*field).to_string(),
            PipelineError::LocatorMiss(target) => match target {
                LocatorTarget::Part(part) => format!(
                    "I couldn't find information for part number {} on PartSelect. Please verify the part number is correct.",
                    part
                ),
                LocatorTarget::Model(model) => format!(
                    "I couldn't find information for model number {}. Please verify the model number is correct.",
                    model
                ),
                LocatorTarget::SymptomPages(symptom) => format!(
                    "I couldn't find specific troubleshooting information for '{}'. Please try rephrasing your issue or contact PartSelect support for assistance.",
                    symptom
                ),
            },
            PipelineError::RetrievalFailure(intent) => retrieval_message(*intent).to_string(),
            PipelineError::IndexFailure(_) => {
                "I couldn't search the product information right now. Please try again in a moment."
                    .to_string()
            }
            PipelineError::GenerationFailure { intent, .. } => generation_message(*intent),
            PipelineError::Timeout { intent, stage } => match stage {
                Stage::Retrieve => retrieval_message(*intent).to_string(),
                Stage::Generate => generation_message(*intent),
            },
        }
    }
}

fn missing_message(field: MissingField) -> &'static str {
    match field {
        MissingField::Symptom => {
            "I couldn't identify a specific issue in your query. Could you please describe the problem you're experiencing with your refrigerator or dishwasher?"
        }
        MissingField::InstallPart => {
            "I couldn't identify a part number in your query. Please provide the part number you want to install (e.g., PS11752778)."
        }
        MissingField::ModelOrBrand => {
            "I couldn't identify a model number or brand in your query. Please provide your appliance's model number (e.g., WDT780SAEM1) to check compatibility."
        }
        MissingField::CompatibilityPart => {
            "I couldn't identify a part number in your query. Please provide the part number you want to check for compatibility."
        }
        MissingField::PartOrModel => {
            "I couldn't identify a part or model number in your question. Please include the part number (e.g., PS11752778) or your appliance's model number."
        }
    }
}

fn retrieval_message(intent: Intent) -> &'static str {
    match intent {
        Intent::Troubleshoot => {
            "I couldn't find detailed troubleshooting information for this issue. Please check PartSelect.com directly or contact their support."
        }
        Intent::Installation => {
            "I couldn't retrieve installation information for this part. Please visit PartSelect.com directly."
        }
        Intent::Compatibility => {
            "I couldn't retrieve compatibility information for this model. Please visit PartSelect.com directly."
        }
        _ => "I couldn't retrieve information for this product. Please visit PartSelect.com directly.",
    }
}

fn generation_message(intent: Intent) -> String {
    let what = match intent {
        Intent::Troubleshoot => "the troubleshooting guide",
        Intent::Installation => "the installation guide",
        Intent::Compatibility => "the compatibility answer",
        _ => "an answer",
    };
    format!(
        "I encountered an error while generating {}. Please try again.",
        what
    )
}
