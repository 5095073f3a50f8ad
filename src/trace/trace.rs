use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::fill::filler::FieldOutcome;
use crate::matching::MatchRung;
use crate::scan::FieldKind;

/// One line of the fill trace: what happened to one field in one pass.
#[derive(Debug, Serialize)]
pub struct FillTraceEvent {
    pub timestamp_ms: u128,
    pub iteration: u32,

    pub field_id: String,
    pub kind: Option<String>,

    pub outcome: String,
    pub value: Option<String>,

    pub matched_option: Option<String>,
    pub rung: Option<MatchRung>,
    pub detail: Option<String>,
}

impl FillTraceEvent {
    pub fn now(iteration: u32, field_id: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            iteration,
            field_id: field_id.to_string(),
            kind: None,
            outcome: String::new(),
            value: None,
            matched_option: None,
            rung: None,
            detail: None,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind.as_str().to_string());
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = outcome.to_string();
        self
    }

    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_match(mut self, option: Option<&str>, rung: Option<MatchRung>) -> Self {
        self.matched_option = option.map(str::to_string);
        self.rung = rung;
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Event describing a filler outcome.
    pub fn from_outcome(iteration: u32, field_id: &str, outcome: &FieldOutcome) -> Self {
        let event = Self::now(iteration, field_id);
        match outcome {
            FieldOutcome::Filled(filled) => event
                .with_kind(filled.kind)
                .with_outcome("filled")
                .with_value(&filled.value)
                .with_match(filled.matched_option.as_deref(), filled.rung)
                .with_detail(format!("{:?}", filled.method)),
            FieldOutcome::Skipped(skipped) => event
                .with_outcome("skipped")
                .with_detail(skipped.reason.describe()),
            FieldOutcome::Failed(error) => event.with_outcome("error").with_detail(&error.issue),
            FieldOutcome::Upload(upload) => event
                .with_kind(FieldKind::File)
                .with_outcome("upload_queued")
                .with_value(&upload.file_type),
            FieldOutcome::NotFound => event.with_outcome("not_found"),
        }
    }
}
