use super::extract::{match_model_number, match_part_number};

const APPLIANCE_KEYWORDS: &[&str] = &[
    "refrigerator",
    "fridge",
    "freezer",
    "dishwasher",
    "ice maker",
    "icemaker",
    "water dispenser",
    "water filter",
    "appliance",
    "crisper",
    "door bin",
    "door shelf",
    "dish rack",
    "spray arm",
];

/// Cheap pre-check run before any LLM, search or scrape call.
///
/// A query is in scope when it names an appliance, or carries something shaped
/// like a part number or a model number.
pub fn is_in_scope(text: &str) -> bool {
    let lower = text.to_lowercase();
    if APPLIANCE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return true;
    }
    match_part_number(text).is_some() || match_model_number(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_and_unrelated_questions_are_out_of_scope() {
        for text in ["hello", "What's the weather in Boston?", "recommend a pasta recipe", ""] {
            assert!(!is_in_scope(text), "{text:?} should be out of scope");
        }
    }

    #[test]
    fn keywords_and_identifiers_are_in_scope() {
        assert!(is_in_scope("My FRIDGE is warm"));
        assert!(is_in_scope("How do I install PS11752778?"));
        assert!(is_in_scope("parts for WDT780SAEM1"));
        assert!(is_in_scope("W10321304 price"));
    }
}
