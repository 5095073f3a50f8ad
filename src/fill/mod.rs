pub mod fill_model;
pub mod filler;
pub mod session;
pub mod upload;

pub use fill_model::{
    FieldError, FieldIssue, FieldMapping, FillConfig, FillMethod, FillReport, FillValue,
    FilledField, ResolverTag, SkipReason, SkippedField,
};
pub use filler::{FieldOutcome, FillTarget, Filler, PendingUpload, locate};
pub use session::{FillSession, FillState, SessionOutcome};
pub use upload::{FetchedFile, FileSource, PathFileSource, attach_uploads, infer_file_type};
