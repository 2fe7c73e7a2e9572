//! Document normalization.
//!
//! Turns parsed report documents into canonical findings, filling the
//! gaps older producer versions leave behind: a missing checker name
//! becomes `"unknown"`, a missing identity is computed from the bug
//! path and the addressed source line. Each document is normalized in
//! isolation; one malformed document never affects its siblings.
//!
//! Recovered defaults and other non-fatal conditions are returned as
//! structured [`NormalizeIssue`] records alongside the findings, so
//! failures are data rather than log side effects (they are still
//! logged at warning level for operators).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::{json, Value};

use reportdiff_diff::FindingCollection;
use reportdiff_domain::annotations;
use reportdiff_types::{
    Finding, HashVersion, Identity, Location, PathElement, SourceFile, CHECKER_KEY,
    DIAGNOSTICS_KEY, FILES_KEY, REPORT_HASH_KEY, UNKNOWN_CHECKER_NAME,
};

use crate::adapter::{AdapterError, ReportParser};
use crate::hash::{context_free_hash, path_context_hash};
use crate::source::SourceAccess;

/// Ingestion behavior switches.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Prepended to file-table paths when the analyzed tree was
    /// relocated (e.g. extracted from an archive).
    pub source_root: Option<PathBuf>,
    /// Algorithm used when a document carries no precomputed identity.
    pub hash_version: HashVersion,
    /// Whether to scan sources for in-source review annotations.
    pub scan_annotations: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            source_root: None,
            hash_version: HashVersion::PathContext,
            scan_annotations: true,
        }
    }
}

/// A non-fatal condition recovered during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeIssue {
    /// A diagnostic carried no checker name; `"unknown"` was used.
    MissingCheckerName { document: String },
    /// A diagnostic carried no precomputed identity; one was computed
    /// and the document should be rewritten (see
    /// [`rewrite_with_identities`]).
    MissingIdentity { document: String, checker: String },
    /// Identity computation failed; the finding carries an empty hash
    /// and will not correlate across runs.
    HashFailed {
        document: String,
        checker: String,
        reason: String,
    },
    /// Conflicting in-source annotations; none was applied.
    AmbiguousAnnotation {
        file: String,
        line: u64,
        checker: String,
    },
}

impl fmt::Display for NormalizeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeIssue::MissingCheckerName { document } => {
                write!(f, "no checker name in '{document}', substituted 'unknown'")
            }
            NormalizeIssue::MissingIdentity { document, checker } => {
                write!(f, "computed missing identity for '{checker}' in '{document}'")
            }
            NormalizeIssue::HashFailed {
                document,
                checker,
                reason,
            } => write!(
                f,
                "identity computation failed for '{checker}' in '{document}': {reason}"
            ),
            NormalizeIssue::AmbiguousAnnotation {
                file,
                line,
                checker,
            } => write!(
                f,
                "conflicting review annotations for '{checker}' at {file}:{line}"
            ),
        }
    }
}

/// One fully normalized report document.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// Path of the report document itself.
    pub path: String,
    /// The document's file table, as recorded by the producer.
    pub files: Vec<String>,
    pub findings: Vec<Finding>,
    pub issues: Vec<NormalizeIssue>,
    /// True when at least one identity had to be computed; the raw
    /// tree has them filled in and can be rewritten to storage.
    pub needs_rewrite: bool,
    /// The document tree with computed identities filled in.
    pub raw: Value,
}

impl NormalizedDocument {
    pub fn file_table(&self) -> Vec<SourceFile> {
        self.files
            .iter()
            .enumerate()
            .map(|(index, path)| SourceFile {
                index,
                path: path.clone(),
            })
            .collect()
    }
}

/// The typed shape of one raw diagnostic record. Everything beyond the
/// handled fields rides along in `extra` verbatim.
#[derive(Debug, serde::Deserialize)]
struct RawDiagnostic {
    #[serde(default)]
    checker: Option<String>,
    location: Location,
    #[serde(default)]
    report_hash: Option<String>,
    #[serde(default)]
    path: Vec<PathElement>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Normalizes one parsed document.
///
/// Fails only for structural defects (missing file table or
/// diagnostics, a type-mangled diagnostic, an out-of-range primary
/// file index); recoverable gaps become [`NormalizeIssue`]s. A
/// successfully parsed document with zero diagnostics is a valid,
/// empty result.
pub fn normalize_document(
    raw: &Value,
    document_path: &str,
    options: &NormalizeOptions,
    source: &dyn SourceAccess,
) -> Result<NormalizedDocument, AdapterError> {
    let files = file_table(raw, document_path)?;
    let diagnostics = raw
        .get(DIAGNOSTICS_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| AdapterError::MissingDiagnostics {
            path: document_path.to_string(),
        })?;

    let mut out = NormalizedDocument {
        path: document_path.to_string(),
        files: files.clone(),
        findings: Vec::with_capacity(diagnostics.len()),
        issues: Vec::new(),
        needs_rewrite: false,
        raw: raw.clone(),
    };

    for (index, diagnostic) in diagnostics.iter().enumerate() {
        let diag: RawDiagnostic = serde_json::from_value(diagnostic.clone()).map_err(|e| {
            AdapterError::MalformedDiagnostic {
                path: document_path.to_string(),
                reason: e.to_string(),
            }
        })?;

        if diag.location.file >= files.len() {
            return Err(AdapterError::FileIndexOutOfRange {
                path: document_path.to_string(),
                index: diag.location.file,
                table_len: files.len(),
            });
        }

        let checker_name = match diag.checker.clone() {
            Some(name) => name,
            None => {
                tracing::warn!(document = document_path, "diagnostic has no checker name");
                out.issues.push(NormalizeIssue::MissingCheckerName {
                    document: document_path.to_string(),
                });
                UNKNOWN_CHECKER_NAME.to_string()
            }
        };

        let file_path = resolve_file_path(&files[diag.location.file], options);

        let identity = match diag.report_hash {
            Some(hash) => Identity {
                hash,
                version: options.hash_version,
            },
            None => {
                let hash = compute_identity(
                    &diag,
                    &checker_name,
                    &file_path,
                    document_path,
                    options,
                    source,
                    &mut out.issues,
                );
                out.issues.push(NormalizeIssue::MissingIdentity {
                    document: document_path.to_string(),
                    checker: checker_name.clone(),
                });
                out.needs_rewrite = true;
                out.raw[DIAGNOSTICS_KEY][index][REPORT_HASH_KEY] = json!(hash.clone());
                Identity {
                    hash,
                    version: options.hash_version,
                }
            }
        };

        let source_annotation = if options.scan_annotations {
            lookup_annotation(
                &file_path,
                diag.location.line,
                &checker_name,
                source,
                &mut out.issues,
            )
        } else {
            None
        };

        let mut main = diag.extra.clone();
        main.insert(CHECKER_KEY.to_string(), json!(checker_name.clone()));
        main.insert(
            "location".to_string(),
            json!({
                "line": diag.location.line,
                "col": diag.location.col,
                "file": diag.location.file,
            }),
        );
        main.insert(REPORT_HASH_KEY.to_string(), json!(identity.hash.clone()));

        let field_str =
            |key: &str| -> Option<String> { main.get(key)?.as_str().map(str::to_string) };

        out.findings.push(Finding {
            category: field_str("category"),
            report_type: field_str("type"),
            severity: field_str("severity"),
            checker_name,
            file_index: diag.location.file,
            file_path,
            identity,
            bug_path: diag.path,
            main,
            source_annotation,
        });
    }

    Ok(out)
}

fn file_table(raw: &Value, document_path: &str) -> Result<Vec<String>, AdapterError> {
    let entries = raw
        .get(FILES_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| AdapterError::MissingFileTable {
            path: document_path.to_string(),
        })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| AdapterError::MalformedFileTable {
                    path: document_path.to_string(),
                    reason: format!("entry {index} is not a string"),
                })
        })
        .collect()
}

fn resolve_file_path(table_path: &str, options: &NormalizeOptions) -> String {
    match &options.source_root {
        Some(root) => root
            .join(table_path.trim_start_matches('/'))
            .to_string_lossy()
            .into_owned(),
        None => table_path.to_string(),
    }
}

fn compute_identity(
    diag: &RawDiagnostic,
    checker_name: &str,
    file_path: &str,
    document_path: &str,
    options: &NormalizeOptions,
    source: &dyn SourceAccess,
    issues: &mut Vec<NormalizeIssue>,
) -> String {
    match options.hash_version {
        HashVersion::PathContext => {
            match path_context_hash(&diag.path, file_path, checker_name, source) {
                Ok(hash) => hash,
                Err(err) => {
                    tracing::warn!(
                        document = document_path,
                        checker = checker_name,
                        error = %err,
                        "identity computation failed"
                    );
                    issues.push(NormalizeIssue::HashFailed {
                        document: document_path.to_string(),
                        checker: checker_name.to_string(),
                        reason: err.to_string(),
                    });
                    String::new()
                }
            }
        }
        HashVersion::ContextFree => {
            let message = diag
                .extra
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            context_free_hash(&diag.location, message, file_path, source)
        }
    }
}

fn lookup_annotation(
    file_path: &str,
    line: u64,
    checker_name: &str,
    source: &dyn SourceAccess,
    issues: &mut Vec<NormalizeIssue>,
) -> Option<reportdiff_types::SourceAnnotation> {
    let text = source.text(file_path)?;
    match annotations::annotation_for_report(&text, line, checker_name) {
        Ok(annotation) => annotation,
        Err(ambiguous) => {
            tracing::warn!(file = file_path, line, checker = checker_name, %ambiguous,
                "ignoring conflicting review annotations");
            issues.push(NormalizeIssue::AmbiguousAnnotation {
                file: file_path.to_string(),
                line,
                checker: checker_name.to_string(),
            });
            None
        }
    }
}

/// Reads, parses and normalizes one report document from disk.
pub fn normalize_file(
    path: &Path,
    parser: &dyn ReportParser,
    options: &NormalizeOptions,
    source: &dyn SourceAccess,
) -> Result<NormalizedDocument, AdapterError> {
    let display_path = path.display().to_string();
    tracing::debug!(document = %display_path, parser = parser.name(), "normalizing report document");

    let text = std::fs::read_to_string(path).map_err(|e| AdapterError::Read {
        path: display_path.clone(),
        source: e,
    })?;
    let raw = parser.parse(&display_path, &text)?;
    normalize_document(&raw, &display_path, options, source)
}

/// A document that failed normalization, reported alongside the
/// successes instead of aborting the batch.
#[derive(Debug)]
pub struct DocumentFailure {
    pub path: String,
    pub error: AdapterError,
}

/// Aggregate of a normalization batch. Document order matches input
/// order; failures are isolated per document and never retried here.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub documents: Vec<NormalizedDocument>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchOutcome {
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.documents.iter().flat_map(|d| d.findings.iter())
    }

    /// Folds every finding into a deduplicated collection.
    pub fn into_collection(self) -> FindingCollection {
        self.documents
            .into_iter()
            .flat_map(|d| d.findings)
            .collect()
    }
}

fn partition(
    results: Vec<(PathBuf, Result<NormalizedDocument, AdapterError>)>,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (path, result) in results {
        match result {
            Ok(document) => outcome.documents.push(document),
            Err(error) => {
                tracing::warn!(document = %path.display(), error = %error,
                    "skipping report document");
                outcome.failures.push(DocumentFailure {
                    path: path.display().to_string(),
                    error,
                });
            }
        }
    }
    outcome
}

/// Normalizes a batch of report documents sequentially.
pub fn normalize_batch(
    paths: &[PathBuf],
    parser: &dyn ReportParser,
    options: &NormalizeOptions,
    source: &dyn SourceAccess,
) -> BatchOutcome {
    partition(
        paths
            .iter()
            .map(|p| (p.clone(), normalize_file(p, parser, options, source)))
            .collect(),
    )
}

/// Normalizes a batch of report documents in parallel, one document
/// per task. Documents share no mutable state; results are aggregated
/// after the join, in input order.
pub fn normalize_batch_parallel(
    paths: &[PathBuf],
    parser: &dyn ReportParser,
    options: &NormalizeOptions,
    source: &dyn SourceAccess,
) -> BatchOutcome {
    partition(
        paths
            .par_iter()
            .map(|p| (p.clone(), normalize_file(p, parser, options, source)))
            .collect(),
    )
}

/// Rewrites the report document on disk with computed identities
/// filled in, so later reads need not recompute them.
///
/// Best-effort by contract: a failure is logged and reported as
/// `false`, and must not fail the read path that produced `document`.
pub fn rewrite_with_identities(document: &NormalizedDocument) -> bool {
    if !document.needs_rewrite {
        return false;
    }

    let serialized = match serde_json::to_string_pretty(&document.raw) {
        Ok(s) => s,
        Err(error) => {
            tracing::warn!(document = %document.path, %error,
                "failed to serialize document for identity rewrite");
            return false;
        }
    };

    match std::fs::write(&document.path, serialized) {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(document = %document.path, %error,
                "failed to rewrite document with identities");
            false
        }
    }
}
