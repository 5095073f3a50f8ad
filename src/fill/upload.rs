use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dom::{AttachedFile, ElementTree, EventKind, NodeId};
use crate::error::{AutofillError, Result};
use crate::fill::fill_model::{FieldError, FieldIssue, FillMethod, FillReport, FilledField};
use crate::fill::filler::PendingUpload;
use crate::scan::label::resolve_label;
use crate::scan::scanner::input_type;
use crate::scan::FieldKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Yields file contents for a file-type key (`resume`, `cover_letter`, ...).
pub trait FileSource {
    fn fetch(&self, file_type: &str) -> Result<FetchedFile>;
}

/// Files on disk, keyed by file type.
#[derive(Debug, Clone, Default)]
pub struct PathFileSource {
    paths: BTreeMap<String, PathBuf>,
}

impl PathFileSource {
    pub fn new(paths: BTreeMap<String, PathBuf>) -> Self {
        Self { paths }
    }

    pub fn insert(&mut self, file_type: &str, path: impl Into<PathBuf>) {
        self.paths.insert(file_type.to_string(), path.into());
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FileSource for PathFileSource {
    fn fetch(&self, file_type: &str) -> Result<FetchedFile> {
        let path = self
            .paths
            .get(file_type)
            .ok_or_else(|| AutofillError::FileSource {
                file_type: file_type.to_string(),
                message: "no file configured".into(),
            })?;
        let bytes = fs::read(path).map_err(|e| AutofillError::FileSource {
            file_type: file_type.to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(FetchedFile {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_type.to_string()),
            mime: guess_mime(path).to_string(),
            bytes,
        })
    }
}

pub fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        Some("rtf") => "application/rtf",
        Some("odt") => "application/vnd.oasis.opendocument.text",
        _ => "application/octet-stream",
    }
}

/// File type a file input most likely wants, from its id, name and label.
pub fn infer_file_type(tree: &dyn ElementTree, node: NodeId) -> Option<&'static str> {
    let haystack = format!(
        "{} {} {}",
        tree.attr(node, "id").unwrap_or_default(),
        tree.attr(node, "name").unwrap_or_default(),
        resolve_label(tree, node)
    )
    .to_lowercase();
    let mentions_cv = haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "cv");
    if haystack.contains("cover") {
        Some("cover_letter")
    } else if haystack.contains("resume") || haystack.contains("résumé") || mentions_cv {
        Some("resume")
    } else {
        None
    }
}

/// Visible file inputs paired with their inferred file type.
pub fn match_file_inputs(tree: &dyn ElementTree) -> Vec<(NodeId, &'static str)> {
    tree.elements_by_tag(&["input"])
        .into_iter()
        .filter(|n| input_type(tree, *n) == "file" && tree.is_visible(*n))
        .filter_map(|n| infer_file_type(tree, n).map(|t| (n, t)))
        .collect()
}

/// Attach fetched files to queued file inputs and record the results.
pub fn attach_uploads(
    tree: &mut dyn ElementTree,
    uploads: &[PendingUpload],
    source: &dyn FileSource,
    report: &mut FillReport,
) {
    for upload in uploads {
        let node = tree.element_by_id(&upload.field_id).or_else(|| {
            match_file_inputs(&*tree)
                .into_iter()
                .find(|(_, t)| *t == upload.file_type)
                .map(|(n, _)| n)
        });
        let Some(node) = node else {
            report.not_found.push(upload.field_id.clone());
            continue;
        };

        match source.fetch(&upload.file_type) {
            Ok(file) => {
                info!(field = %upload.field_id, file = %file.name, "attaching file");
                let name = file.name.clone();
                tree.attach_file(
                    node,
                    AttachedFile {
                        name: file.name,
                        mime: file.mime,
                        bytes: file.bytes,
                    },
                );
                tree.dispatch(node, EventKind::Change);
                report.filled.push(FilledField {
                    id: upload.field_id.clone(),
                    kind: FieldKind::File,
                    value: name,
                    method: FillMethod::Upload,
                    matched_option: None,
                    rung: None,
                });
            }
            Err(e) => {
                warn!(field = %upload.field_id, "upload failed: {}", e);
                report.errors.push(FieldError {
                    id: upload.field_id.clone(),
                    issue: FieldIssue::UploadFailed {
                        file_type: upload.file_type.clone(),
                        message: e.to_string(),
                    },
                });
            }
        }
    }
}
