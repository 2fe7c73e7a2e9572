//! Pluggable report-document parsing.
//!
//! A parser turns producer output into the self-describing document
//! tree; everything downstream (normalization, pruning, hashing) works
//! on that tree. The portable [`JsonParser`] is always available;
//! accelerated parsers are a swappable strategy behind the same trait,
//! never a hard dependency.

use serde_json::Value;

/// Failure to ingest a single report document. Never aborts the batch:
/// sibling documents are processed regardless.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("failed to read report document '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse report document '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("report document '{path}' has no 'files' table")]
    MissingFileTable { path: String },

    #[error("report document '{path}' has no 'diagnostics' sequence")]
    MissingDiagnostics { path: String },

    #[error("malformed file table in report document '{path}': {reason}")]
    MalformedFileTable { path: String, reason: String },

    #[error("malformed diagnostic in report document '{path}': {reason}")]
    MalformedDiagnostic { path: String, reason: String },

    #[error("diagnostic in '{path}' references file {index} outside the table of {table_len}")]
    FileIndexOutOfRange {
        path: String,
        index: usize,
        table_len: usize,
    },
}

impl AdapterError {
    /// Path of the document that failed.
    pub fn document_path(&self) -> &str {
        match self {
            AdapterError::Read { path, .. }
            | AdapterError::Parse { path, .. }
            | AdapterError::MissingFileTable { path }
            | AdapterError::MissingDiagnostics { path }
            | AdapterError::MalformedFileTable { path, .. }
            | AdapterError::MalformedDiagnostic { path, .. }
            | AdapterError::FileIndexOutOfRange { path, .. } => path,
        }
    }
}

/// Strategy interface for turning raw producer output into the
/// document tree.
pub trait ReportParser: Sync {
    /// Parser name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Parses `text` into a document tree. `path` only labels errors.
    fn parse(&self, path: &str, text: &str) -> Result<Value, AdapterError>;
}

/// The portable parser over the JSON document format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ReportParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, path: &str, text: &str) -> Result<Value, AdapterError> {
        serde_json::from_str(text).map_err(|source| AdapterError::Parse {
            path: path.to_string(),
            source,
        })
    }
}
