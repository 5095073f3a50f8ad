use tracing::{info, warn};

use crate::{
    dom::ElementTree,
    error::{AutofillError, Result},
    fill::{FileSource, FillConfig, FillSession, SessionOutcome, SkipReason, SkippedField, attach_uploads},
    resolver::Resolver,
    scan::Scanner,
    trace::TraceLogger,
};

pub mod cli;
pub mod dom;
pub mod error;
pub mod fill;
pub mod logging;
pub mod matching;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod trace;

/// Knobs for one [`run_autofill`] call.
#[derive(Default)]
pub struct AutofillOptions<'a> {
    pub fill: FillConfig,
    /// Text for cover-letter text fields.
    pub cover_letter: Option<String>,
    /// Where upload-tagged file inputs get their files. Without one, queued
    /// uploads are reported as skipped.
    pub files: Option<&'a dyn FileSource>,
    pub tracer: Option<&'a TraceLogger>,
}

/// Scan the page, resolve values, fill until the form stops growing, then
/// attach any queued uploads.
///
/// Only page-level problems and resolver failures are errors; everything
/// that goes wrong with a single field is in the returned report.
pub fn run_autofill(
    tree: &mut dyn ElementTree,
    scanner: &Scanner,
    resolver: &dyn Resolver,
    options: AutofillOptions<'_>,
) -> Result<SessionOutcome> {
    let root = tree.root();
    if tree.descendants(root).is_empty() {
        return Err(AutofillError::InvalidInput(format!(
            "page '{}' has no elements",
            tree.url()
        )));
    }

    let mut session = FillSession::new(scanner, resolver, options.fill)
        .with_cover_letter(options.cover_letter);
    if let Some(tracer) = options.tracer {
        session = session.with_tracer(tracer);
    }
    let mut outcome = session.run(tree)?;

    if !outcome.uploads.is_empty() {
        match options.files {
            Some(source) => {
                info!(uploads = outcome.uploads.len(), "attaching files");
                attach_uploads(tree, &outcome.uploads, source, &mut outcome.report);
            }
            None => {
                warn!(uploads = outcome.uploads.len(), "no file source, uploads skipped");
                for upload in &outcome.uploads {
                    outcome.report.skipped.push(SkippedField {
                        id: upload.field_id.clone(),
                        reason: SkipReason::UploadQueued,
                    });
                }
            }
        }
    }

    Ok(outcome)
}
