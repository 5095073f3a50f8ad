use serde::Serialize;

use crate::dom::collapse_whitespace;
use crate::matching::synonyms::{canonical_key, is_negation_word, is_stop_word};

/// Minimum share of the smaller token set that has to overlap.
const TOKEN_OVERLAP_THRESHOLD: f64 = 0.5;

/// The rung of the ladder that accepted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRung {
    Exact,
    Boolean,
    Canonical,
    Substring,
    TokenOverlap,
}

impl MatchRung {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchRung::Exact => "exact",
            MatchRung::Boolean => "boolean",
            MatchRung::Canonical => "canonical",
            MatchRung::Substring => "substring",
            MatchRung::TokenOverlap => "token_overlap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Same concept, but exactly one side is negated.
    NegationMismatch,
    /// Both sides name a known canonical entity, and they differ.
    DistinctCanonical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchVerdict {
    Match(MatchRung),
    Rejected(Rejection),
    NoMatch,
}

impl MatchVerdict {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchVerdict::Match(_))
    }

    pub fn rung(&self) -> Option<MatchRung> {
        match self {
            MatchVerdict::Match(rung) => Some(*rung),
            _ => None,
        }
    }
}

/// Anything with an option value and display text.
pub trait ChoiceText {
    fn choice_value(&self) -> &str;
    fn choice_text(&self) -> &str;
}

// ============================================================================
// Normalization
// ============================================================================

/// Trim, collapse whitespace, lowercase.
pub fn normalize(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Boolean class of a normalized string, if any.
///
/// Besides the bare tokens this accepts answers that lead with yes/no and
/// then elaborate ("No, I do not require sponsorship").
pub fn boolean_class(normalized: &str) -> Option<bool> {
    match normalized {
        "true" | "yes" | "1" | "t" | "y" => return Some(true),
        "false" | "no" | "0" | "f" | "n" => return Some(false),
        _ => {}
    }
    for (prefix, class) in [("yes", true), ("no", false)] {
        if let Some(rest) = normalized.strip_prefix(prefix)
            && rest.starts_with([',', '-', '.', ':', ';'])
        {
            return Some(class);
        }
    }
    None
}

/// Remove `( ... )` clarifications.
pub fn strip_parentheticals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    collapse_whitespace(&out)
}

/// Lowercase words; apostrophes stay so contractions remain recognizable.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn is_negated(words: &[String]) -> bool {
    words.iter().any(|w| is_negation_word(w))
}

fn without_negation(words: &[String]) -> Vec<String> {
    words
        .iter()
        .filter(|w| !is_negation_word(w))
        .cloned()
        .collect()
}

fn content_tokens(words: &[String]) -> Vec<String> {
    words
        .iter()
        .filter(|w| !is_negation_word(w) && !is_stop_word(w))
        .cloned()
        .collect()
}

/// Whole-word phrase containment.
fn contains_phrase(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn related_tokens(a: &str, b: &str) -> bool {
    a == b || (a.len() >= 3 && b.len() >= 3 && (a.contains(b) || b.contains(a)))
}

// ============================================================================
// Ladder
// ============================================================================

/// Decide whether `candidate` denotes the option `(value, text)`.
///
/// Rungs are tried strictly in order: exact, boolean, canonical group,
/// negation-safe phrase containment, shared-concept negation check, token
/// overlap. The rejection rungs stop the ladder so looser rungs below can
/// never accept a pair an earlier rung ruled out.
pub fn match_option(candidate: &str, value: &str, text: &str) -> MatchVerdict {
    let cand = normalize(candidate);
    if cand.is_empty() {
        return MatchVerdict::NoMatch;
    }
    let value_n = normalize(value);
    let text_n = normalize(text);

    // 1. exact
    if (!value_n.is_empty() && cand == value_n) || (!text_n.is_empty() && cand == text_n) {
        return MatchVerdict::Match(MatchRung::Exact);
    }

    // 2. boolean
    if let Some(class) = boolean_class(&cand)
        && (boolean_class(&value_n) == Some(class) || boolean_class(&text_n) == Some(class))
    {
        return MatchVerdict::Match(MatchRung::Boolean);
    }

    let option = if text_n.is_empty() { &value_n } else { &text_n };
    if option.is_empty() {
        return MatchVerdict::NoMatch;
    }
    let cand_stripped = strip_parentheticals(&cand);
    let option_stripped = strip_parentheticals(option);

    // 3. canonical groups
    let cand_key = canonical_key(&cand).or_else(|| canonical_key(&cand_stripped));
    let option_key = canonical_key(option)
        .or_else(|| canonical_key(&option_stripped))
        .or_else(|| canonical_key(&value_n));
    match (cand_key, option_key) {
        (Some(a), Some(b)) if a == b => return MatchVerdict::Match(MatchRung::Canonical),
        (Some(_), Some(_)) => return MatchVerdict::Rejected(Rejection::DistinctCanonical),
        _ => {}
    }

    let cand_words = words(&cand_stripped);
    let option_words = words(&option_stripped);
    let negation_differs = is_negated(&cand_words) != is_negated(&option_words);

    // 4. negation-safe containment
    let cand_core = without_negation(&cand_words);
    let option_core = without_negation(&option_words);
    let contained = contains_phrase(&cand_words, &option_words)
        || contains_phrase(&option_words, &cand_words)
        || contains_phrase(&cand_core, &option_core)
        || contains_phrase(&option_core, &cand_core);
    if contained {
        return if negation_differs {
            MatchVerdict::Rejected(Rejection::NegationMismatch)
        } else {
            MatchVerdict::Match(MatchRung::Substring)
        };
    }

    // 5. shared concept, opposite polarity
    let cand_tokens = content_tokens(&cand_words);
    let option_tokens = content_tokens(&option_words);
    let shares_concept = cand_tokens
        .iter()
        .any(|c| c.len() >= 3 && option_tokens.iter().any(|o| o == c));
    if shares_concept && negation_differs {
        return MatchVerdict::Rejected(Rejection::NegationMismatch);
    }

    // 6. token overlap
    if cand_tokens.is_empty() || option_tokens.is_empty() {
        return MatchVerdict::NoMatch;
    }
    let hits = cand_tokens
        .iter()
        .filter(|c| option_tokens.iter().any(|o| related_tokens(c, o)))
        .count();
    let smaller = cand_tokens.len().min(option_tokens.len());
    if hits as f64 / smaller as f64 >= TOKEN_OVERLAP_THRESHOLD {
        return MatchVerdict::Match(MatchRung::TokenOverlap);
    }

    MatchVerdict::NoMatch
}

/// Boolean shorthand for [`match_option`].
pub fn fuzzy_match(candidate: &str, value: &str, text: &str) -> bool {
    match_option(candidate, value, text).is_match()
}

/// Pick the option a candidate refers to.
///
/// Every option is checked for an exact match before any looser rung runs,
/// then the full ladder is applied in option order.
pub fn find_option<O: ChoiceText>(candidate: &str, options: &[O]) -> Option<(usize, MatchRung)> {
    let cand = normalize(candidate);
    if cand.is_empty() {
        return None;
    }
    let exact = options.iter().position(|o| {
        let value = normalize(o.choice_value());
        let text = normalize(o.choice_text());
        (!value.is_empty() && value == cand) || (!text.is_empty() && text == cand)
    });
    if let Some(idx) = exact {
        return Some((idx, MatchRung::Exact));
    }
    options.iter().enumerate().find_map(|(idx, o)| {
        match_option(candidate, o.choice_value(), o.choice_text())
            .rung()
            .map(|rung| (idx, rung))
    })
}
