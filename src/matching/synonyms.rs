use std::collections::HashMap;
use std::sync::LazyLock;

// ============================================================================
// Canonical groups
// ============================================================================

/// Country names and their common abbreviations. Lookups ignore periods, so
/// `u.s.a.` and `usa` are the same entry.
const COUNTRIES: &[(&str, &[&str])] = &[
    (
        "united_states",
        &["united states", "united states of america", "us", "usa", "america", "the united states"],
    ),
    (
        "united_kingdom",
        &["united kingdom", "uk", "great britain", "britain", "england", "the united kingdom"],
    ),
    ("canada", &["canada"]),
    ("germany", &["germany", "deutschland"]),
    ("france", &["france"]),
    ("india", &["india", "bharat"]),
    ("australia", &["australia"]),
    ("netherlands", &["netherlands", "the netherlands", "holland"]),
    ("ireland", &["ireland", "republic of ireland"]),
    ("spain", &["spain", "españa"]),
    ("mexico", &["mexico", "méxico"]),
    ("brazil", &["brazil", "brasil"]),
    ("china", &["china", "prc", "people's republic of china"]),
    ("japan", &["japan"]),
    ("south_korea", &["south korea", "korea", "republic of korea"]),
    ("new_zealand", &["new zealand", "nz"]),
    ("singapore", &["singapore"]),
    ("switzerland", &["switzerland"]),
    ("sweden", &["sweden"]),
    ("israel", &["israel"]),
    ("italy", &["italy"]),
    ("poland", &["poland"]),
    ("portugal", &["portugal"]),
    ("uae", &["united arab emirates", "uae"]),
];

/// Gender, ethnicity and disclosure answers as they appear on voluntary
/// self-identification sections.
const IDENTITY: &[(&str, &[&str])] = &[
    (
        "non_binary",
        &["non-binary", "nonbinary", "non binary", "enby", "nb", "genderqueer"],
    ),
    (
        "decline",
        &[
            "prefer not to say",
            "prefer not to answer",
            "prefer not to disclose",
            "i prefer not to say",
            "i prefer not to answer",
            "decline to state",
            "decline to answer",
            "decline to self identify",
            "decline to self-identify",
            "i don't wish to answer",
            "i do not wish to answer",
            "decline",
        ],
    ),
    ("male", &["male", "man", "cis male", "cisgender male"]),
    ("female", &["female", "woman", "cis female", "cisgender female"]),
    (
        "hispanic_latino",
        &["hispanic", "latino", "latina", "latinx", "hispanic or latino", "hispanic/latino"],
    ),
    (
        "black",
        &["black", "african american", "black or african american", "black/african american"],
    ),
    ("white", &["white", "caucasian"]),
    ("asian", &["asian", "asian american"]),
    (
        "two_or_more",
        &["two or more races", "two or more", "multiracial", "mixed race", "mixed"],
    ),
    (
        "native_american",
        &["american indian or alaska native", "native american", "alaska native"],
    ),
    (
        "pacific_islander",
        &["native hawaiian or other pacific islander", "pacific islander", "native hawaiian"],
    ),
];

static CANONICAL: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (key, aliases) in COUNTRIES.iter().chain(IDENTITY.iter()) {
        for alias in aliases.iter() {
            map.insert(alias.to_string(), *key);
            map.insert(alias.replace('.', ""), *key);
        }
    }
    map
});

/// Canonical key for an already-normalized phrase.
pub fn canonical_key(normalized: &str) -> Option<&'static str> {
    if normalized.is_empty() {
        return None;
    }
    CANONICAL
        .get(normalized)
        .or_else(|| CANONICAL.get(&normalized.replace('.', "")))
        .copied()
}

// ============================================================================
// Word lists
// ============================================================================

pub const NEGATION_WORDS: &[&str] = &["not", "no", "non", "never", "cannot", "none", "neither"];

pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "i", "am", "is", "are", "be", "to", "of", "or", "and", "in", "on", "for",
    "my", "me", "at", "as", "by", "with", "this", "that", "it",
];

pub fn is_negation_word(word: &str) -> bool {
    NEGATION_WORDS.contains(&word) || word.ends_with("n't")
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}
