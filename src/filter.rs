//! Keyword/pattern relevance gate that runs before any model call.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const REASON_OFF_TOPIC: &str = "off-topic pattern";
pub const REASON_NO_CONNECTION: &str = "no clear connection";

/// Short questions under this many characters get the benefit of the doubt.
const SHORT_QUESTION_CHARS: usize = 100;

const KEYWORDS: &[&str] = &[
    "charles",
    "pfaff",
    "fridgepal",
    "catalyst",
    "make noise",
    "portfolio",
    "resume",
    "case study",
    "project",
    "design system",
    "react",
    "typescript",
    "tailwind",
    "supabase",
    "storybook",
    "figma",
    "framer",
    "creative technologist",
    "front-end engineer",
    "ux engineer",
    "richmond",
    "virginia",
];

static OFF_TOPIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^how (do|can|would) i",
        r"^what('s| is) the weather",
        r"^who won",
        r"^tell me about (apple|microsoft|google|amazon|meta)",
        r"^how (to|do you) make",
        r"recipe",
        r"cooking",
        r"baking",
        r"chocolate chip cookies",
        r"election",
        r"politics",
        r"sports",
        r"movie",
        r"music (artist|album|song)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("off-topic pattern"))
    .collect()
});

static GENERIC_QUESTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(what|who|where|when|how) (is|are|was|were|does|did|can|will)",
        r"^(tell me|describe|explain) (about|more about)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("question pattern"))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub relevant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FilterResult {
    fn accept() -> Self {
        Self {
            relevant: true,
            reason: None,
        }
    }

    fn reject(reason: &str) -> Self {
        Self {
            relevant: false,
            reason: Some(reason.to_string()),
        }
    }
}

pub fn filter_question(text: &str) -> FilterResult {
    let normalized = text.trim().to_lowercase();

    if OFF_TOPIC.iter().any(|re| re.is_match(&normalized)) {
        return FilterResult::reject(REASON_OFF_TOPIC);
    }

    if KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
        return FilterResult::accept();
    }

    let generic = GENERIC_QUESTION.iter().any(|re| re.is_match(&normalized));
    if generic && normalized.chars().count() < SHORT_QUESTION_CHARS {
        return FilterResult::accept();
    }

    FilterResult::reject(REASON_NO_CONNECTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_weather() {
        let result = filter_question("What is the weather today?");
        assert!(!result.relevant);
        assert_eq!(result.reason.as_deref(), Some(REASON_OFF_TOPIC));
    }

    #[test]
    fn accepts_project_questions() {
        assert!(filter_question("Tell me about Charles Pfaff's FridgePal project").relevant);
        assert!(filter_question("  Show his DESIGN SYSTEM work ").relevant);
    }

    #[test]
    fn off_topic_patterns_win_over_keywords() {
        assert!(!filter_question("How do I build a React app?").relevant);
        assert!(!filter_question("A recipe for the catalyst cake").relevant);
        assert!(!filter_question("Tell me about Google").relevant);
    }

    #[test]
    fn short_generic_questions_get_benefit_of_the_doubt() {
        assert!(filter_question("Where is he based?").relevant);
        assert!(filter_question("Describe about his process").relevant);
    }

    #[test]
    fn long_generic_questions_are_rejected() {
        let long = format!("What is {}", "the meaning of everything ".repeat(5));
        assert!(long.len() >= SHORT_QUESTION_CHARS);
        let result = filter_question(&long);
        assert_eq!(result.reason.as_deref(), Some(REASON_NO_CONNECTION));
    }

    #[test]
    fn unrelated_statements_are_rejected() {
        let result = filter_question("Build me a landing page for a bakery chain");
        assert!(!result.relevant);
        assert_eq!(result.reason.as_deref(), Some(REASON_NO_CONNECTION));
    }

    #[test]
    fn is_deterministic() {
        let text = "Who was his biggest client?";
        assert_eq!(filter_question(text), filter_question(text));
    }
}
