use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::matching::MatchRung;
use crate::scan::FieldKind;

// ============================================================================
// Values
// ============================================================================

/// Semantic markers a resolver may return instead of a literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverTag {
    ResumeFile,
    CoverLetterFile,
    CoverLetterText,
    NeedsHuman,
    Skip,
}

impl ResolverTag {
    pub fn marker(&self) -> &'static str {
        match self {
            ResolverTag::ResumeFile => "__RESUME_FILE__",
            ResolverTag::CoverLetterFile => "__COVER_LETTER_FILE__",
            ResolverTag::CoverLetterText => "__COVER_LETTER_TEXT__",
            ResolverTag::NeedsHuman => "__NEEDS_HUMAN__",
            ResolverTag::Skip => "__SKIP__",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim() {
            "__RESUME_FILE__" => Some(ResolverTag::ResumeFile),
            "__COVER_LETTER_FILE__" => Some(ResolverTag::CoverLetterFile),
            "__COVER_LETTER_TEXT__" => Some(ResolverTag::CoverLetterText),
            "__NEEDS_HUMAN__" => Some(ResolverTag::NeedsHuman),
            "__SKIP__" => Some(ResolverTag::Skip),
            _ => None,
        }
    }

    /// File-type key for tags that mean "upload a file".
    pub fn file_type(&self) -> Option<&'static str> {
        match self {
            ResolverTag::ResumeFile => Some("resume"),
            ResolverTag::CoverLetterFile => Some("cover_letter"),
            _ => None,
        }
    }
}

/// A value to put into one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FillValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
    Tag(ResolverTag),
}

impl FillValue {
    /// String form used for matching and typing.
    pub fn as_text(&self) -> String {
        match self {
            FillValue::Text(text) => text.clone(),
            FillValue::Bool(true) => "Yes".to_string(),
            FillValue::Bool(false) => "No".to_string(),
            FillValue::List(items) => items.join(", "),
            FillValue::Tag(tag) => tag.marker().to_string(),
        }
    }

    /// Individual candidates, one per list element.
    pub fn candidates(&self) -> Vec<String> {
        match self {
            FillValue::List(items) => items.clone(),
            other => vec![other.as_text()],
        }
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        match ResolverTag::from_marker(value) {
            Some(tag) => FillValue::Tag(tag),
            None => FillValue::Text(value.to_string()),
        }
    }
}

impl From<String> for FillValue {
    fn from(value: String) -> Self {
        FillValue::from(value.as_str())
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        FillValue::Bool(value)
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Serialize for FillValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FillValue::Text(text) => serializer.serialize_str(text),
            FillValue::Bool(b) => serializer.serialize_bool(*b),
            FillValue::List(items) => items.serialize(serializer),
            FillValue::Tag(tag) => serializer.serialize_str(tag.marker()),
        }
    }
}

impl<'de> Deserialize<'de> for FillValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(FillValue::from_json(Value::deserialize(deserializer)?))
    }
}

impl FillValue {
    /// `null` means skip, numbers become text, unknown markers stay literal.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => FillValue::Tag(ResolverTag::Skip),
            Value::Bool(b) => FillValue::Bool(b),
            Value::Number(n) => FillValue::Text(n.to_string()),
            Value::String(s) => FillValue::from(s),
            Value::Array(items) => FillValue::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            other => FillValue::Text(other.to_string()),
        }
    }
}

/// Field id to value, in id order.
pub type FieldMapping = BTreeMap<String, FillValue>;

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    Toggle,
    SelectValue,
    TypeAndSelect,
    ButtonClick,
    TextInput,
    Upload,
    AlreadySet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledField {
    pub id: String,
    pub kind: FieldKind,
    pub value: String,
    pub method: FillMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rung: Option<MatchRung>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum FieldIssue {
    OptionNotFound { candidate: String, options: Vec<String> },
    NotBoolean { candidate: String },
    Unsupported { kind: FieldKind },
    UploadFailed { file_type: String, message: String },
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::OptionNotFound { candidate, options } => {
                write!(f, "no option matches '{}' (options: {})", candidate, options.join(", "))
            }
            FieldIssue::NotBoolean { candidate } => {
                write!(f, "'{}' is not a yes/no value", candidate)
            }
            FieldIssue::Unsupported { kind } => {
                write!(f, "cannot fill a field of kind {}", kind.as_str())
            }
            FieldIssue::UploadFailed { file_type, message } => {
                write!(f, "upload of {} failed: {}", file_type, message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub id: String,
    #[serde(flatten)]
    pub issue: FieldIssue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    FileInput,
    NeedsHuman,
    ResolverSkip,
    NoCoverLetter,
    NotAFileInput,
    UploadQueued,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::FileInput => "file input (handled by upload step)",
            SkipReason::NeedsHuman => "needs human attention",
            SkipReason::ResolverSkip => "resolver asked to skip",
            SkipReason::NoCoverLetter => "no cover letter text",
            SkipReason::NotAFileInput => "file tag on a non-file field",
            SkipReason::UploadQueued => "queued for upload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedField {
    pub id: String,
    pub reason: SkipReason,
}

/// Aggregated outcome of a fill session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub filled: Vec<FilledField>,
    pub not_found: Vec<String>,
    pub errors: Vec<FieldError>,
    pub skipped: Vec<SkippedField>,
    pub warnings: Vec<String>,
    pub iterations: u32,
    pub navigation_interrupted: bool,
}

impl FillReport {
    /// No errors and nothing left unlocated.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.not_found.is_empty()
    }

    pub fn filled_ids(&self) -> Vec<&str> {
        self.filled.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn was_filled(&self, id: &str) -> bool {
        self.filled.iter().any(|f| f.id == id)
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    pub max_iterations: u32,
    pub rescan_delay_ms: u64,
    pub combobox_wait_ms: u64,
    /// Plain-text file used for cover-letter text fields.
    pub cover_letter: Option<PathBuf>,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            rescan_delay_ms: 800,
            combobox_wait_ms: 300,
            cover_letter: None,
        }
    }
}
