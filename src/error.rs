use thiserror::Error;

/// Caller-facing failures. Problems with an individual field never surface
/// here; they are collected into the fill report instead.
#[derive(Debug, Error)]
pub enum AutofillError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error ({context}): {message}")]
    Parse { context: String, message: String },

    /// Malformed or absent top-level input, e.g. an empty page.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unexpected DOM structure: {0}")]
    DomStructure(String),

    #[error("resolver request failed: {0}")]
    ResolverTransport(#[from] reqwest::Error),

    #[error("resolver returned an error: {0}")]
    Resolver(String),

    #[error("could not load {file_type} file: {message}")]
    FileSource { file_type: String, message: String },
}

pub type Result<T> = std::result::Result<T, AutofillError>;
