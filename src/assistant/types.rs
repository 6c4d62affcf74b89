use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Troubleshoot,
    Installation,
    Compatibility,
    Qna,
    General,
    OutOfScope,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Troubleshoot,
        Intent::Installation,
        Intent::Compatibility,
        Intent::Qna,
        Intent::General,
        Intent::OutOfScope,
    ];

    /// Parses a taxonomy token. Anything outside the taxonomy is `None`.
    pub fn from_label(value: &str) -> Option<Self> {
        let token = value
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
            .to_lowercase()
            .replace(['-', ' '], "_");
        match token.as_str() {
            "troubleshoot" | "troubleshooting" => Some(Intent::Troubleshoot),
            "installation" | "install" => Some(Intent::Installation),
            "compatibility" => Some(Intent::Compatibility),
            "qna" | "q&a" => Some(Intent::Qna),
            "general" => Some(Intent::General),
            "out_of_scope" => Some(Intent::OutOfScope),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Troubleshoot => "troubleshoot",
            Intent::Installation => "installation",
            Intent::Compatibility => "compatibility",
            Intent::Qna => "qna",
            Intent::General => "general",
            Intent::OutOfScope => "out_of_scope",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceType {
    Refrigerator,
    Dishwasher,
}

impl ApplianceType {
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "refrigerator" | "fridge" | "freezer" => Some(ApplianceType::Refrigerator),
            "dishwasher" => Some(ApplianceType::Dishwasher),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplianceType::Refrigerator => "refrigerator",
            ApplianceType::Dishwasher => "dishwasher",
        }
    }
}

/// Entities pulled out of one query. No field implies another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub model_number: Option<String>,
    pub part_number: Option<String>,
    pub brand: Option<String>,
    pub symptom: Option<String>,
    pub appliance_type: Option<ApplianceType>,
}

#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub session_id: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// What the router hands back for every query, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub response: String,
    pub status: OutcomeStatus,
}

impl ChatOutcome {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            status: OutcomeStatus::Success,
        }
    }

    pub fn error(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            status: OutcomeStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_labels_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(intent.as_str()), Some(intent));
        }
    }

    #[test]
    fn intent_label_tolerates_noise() {
        assert_eq!(Intent::from_label(" \"Troubleshoot\".\n"), Some(Intent::Troubleshoot));
        assert_eq!(Intent::from_label("out-of-scope"), Some(Intent::OutOfScope));
        assert_eq!(Intent::from_label("recipe"), None);
    }

    #[test]
    fn outcome_serializes_status_lowercase() {
        let json = serde_json::to_value(ChatOutcome::error("nope")).unwrap();
        assert_eq!(json["status"], "error");
    }
}
