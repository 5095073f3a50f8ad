pub mod actions;
pub mod field_model;
pub mod heuristics;
pub mod identity;
pub mod job_context;
pub mod label;
pub mod options;
pub mod scanner;

pub use field_model::{
    ActionDescriptor, ActionKind, FieldDescriptor, FieldKind, FieldOption, JobContext, NO_LABEL,
    OptionSource, ScanResult,
};
pub use heuristics::{BooleanQuestionClassifier, BooleanSignal, YesNoHeuristic};
pub use job_context::extract_job_context;
pub use scanner::{ScanConfig, Scanner, detect_button_groups};
