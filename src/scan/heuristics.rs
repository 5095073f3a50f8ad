use std::sync::LazyLock;

use regex::Regex;

use crate::scan::field_model::FieldOption;

/// Which pattern family flagged a question as yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BooleanSignal {
    Interrogative,
    Keyword(String),
    Acknowledgment,
}

/// Decides whether free question text expects a yes/no answer.
pub trait BooleanQuestionClassifier: Send + Sync {
    fn classify(&self, question: &str) -> Option<BooleanSignal>;
}

static WH_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(what|which|where|when|why|how|who|whom|whose)\b").expect("valid regex")
});

static INTERROGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^\s*(are|do|does|did|have|has|had|will|would|can|could|should|is|were|was)\s+(you|your)\b)|\b(are you|do you|have you|will you|would you|can you|did you|is your)\b|\?\s*$",
    )
    .expect("valid regex")
});

static STRONG_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(sponsorship|sponsor|visa|relocat\w*|interviewed|previously (worked|employed)|clearance|authori[sz]ed to work|work authori[sz]ation|18 years|eighteen|background check|drug (screen|test)\w*|non-compete|felony|convicted|willing to travel|commute)\b",
    )
    .expect("valid regex")
});

static ACKNOWLEDGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(policy|agree\w*|certify|consent|acknowledge\w*|attest|confirm that)\b")
        .expect("valid regex")
});

static MENTIONS_YES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byes\b").expect("valid regex"));
static MENTIONS_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bno\b").expect("valid regex"));

/// Regex classifier over interrogative phrasing, a strong keyword list and
/// consent wording. Extra keywords and terms are plain lowercase substrings.
#[derive(Debug, Clone, Default)]
pub struct YesNoHeuristic {
    extra_keywords: Vec<String>,
    extra_acknowledgments: Vec<String>,
}

impl YesNoHeuristic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_terms(keywords: &[String], acknowledgments: &[String]) -> Self {
        let lower = |terms: &[String]| -> Vec<String> {
            terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            extra_keywords: lower(keywords),
            extra_acknowledgments: lower(acknowledgments),
        }
    }
}

impl BooleanQuestionClassifier for YesNoHeuristic {
    fn classify(&self, question: &str) -> Option<BooleanSignal> {
        let text = question.trim();
        if text.is_empty() {
            return None;
        }
        let lower = text.to_lowercase();

        // Open questions ("What is your ...?") never get yes/no.
        if !WH_QUESTION.is_match(text) {
            if INTERROGATIVE.is_match(text) {
                return Some(BooleanSignal::Interrogative);
            }
            if let Some(m) = STRONG_KEYWORDS.find(text) {
                return Some(BooleanSignal::Keyword(m.as_str().to_lowercase()));
            }
            if let Some(k) = self.extra_keywords.iter().find(|k| lower.contains(k.as_str())) {
                return Some(BooleanSignal::Keyword(k.clone()));
            }
        }

        if ACKNOWLEDGMENT.is_match(text)
            || (MENTIONS_YES.is_match(text) && MENTIONS_NO.is_match(text))
            || self
                .extra_acknowledgments
                .iter()
                .any(|t| lower.contains(t.as_str()))
        {
            return Some(BooleanSignal::Acknowledgment);
        }

        None
    }
}

pub fn yes_no_options() -> Vec<FieldOption> {
    vec![FieldOption::new("Yes", "Yes"), FieldOption::new("No", "No")]
}
