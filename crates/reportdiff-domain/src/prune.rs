//! Document compaction after path exclusion.
//!
//! Removes diagnostics that reference excluded files and renumbers the
//! file table plus every surviving file reference, preserving
//! referential integrity: every `file` field of a kept diagnostic
//! indexes a valid entry of the compacted table.

use std::collections::BTreeMap;

use serde_json::Value;

use reportdiff_types::{DIAGNOSTICS_KEY, FILES_KEY, FILE_REF_KEY};

/// Pruning failed because the input document is structurally invalid.
/// The caller must keep using the original document in that case.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PruneError {
    #[error("document has no 'files' table")]
    MissingFileTable,
    #[error("document has no 'diagnostics' sequence")]
    MissingDiagnostics,
    #[error("file table entry {index} is not a string")]
    MalformedFileEntry { index: usize },
}

/// A compacted document plus bookkeeping about what was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedDocument {
    pub document: Value,
    pub dropped_files: usize,
    pub dropped_diagnostics: usize,
}

/// Drops every file for which `drop` returns true, compacts the file
/// table and renumbers all file references inside the surviving
/// diagnostics.
///
/// A diagnostic referencing a dropped file anywhere inside its tree is
/// removed entirely, never partially redacted. The input document is
/// left untouched; other top-level fields are carried over verbatim.
pub fn prune(
    document: &Value,
    drop: impl Fn(&str) -> bool,
) -> Result<PrunedDocument, PruneError> {
    let files = document
        .get(FILES_KEY)
        .and_then(Value::as_array)
        .ok_or(PruneError::MissingFileTable)?;
    let diagnostics = document
        .get(DIAGNOSTICS_KEY)
        .and_then(Value::as_array)
        .ok_or(PruneError::MissingDiagnostics)?;

    // Old index -> compacted index for every kept file; dropped files
    // have no entry.
    let mut renumber = BTreeMap::new();
    let mut kept_files = Vec::new();
    for (index, entry) in files.iter().enumerate() {
        let path = entry
            .as_str()
            .ok_or(PruneError::MalformedFileEntry { index })?;
        if !drop(path) {
            renumber.insert(index, kept_files.len());
            kept_files.push(entry.clone());
        }
    }
    let dropped_files = files.len() - kept_files.len();

    let mut kept_diagnostics = Vec::new();
    let mut dropped_diagnostics = 0usize;
    for diagnostic in diagnostics {
        let mut rewritten = diagnostic.clone();
        if rewrite_file_refs(&mut rewritten, &renumber) {
            kept_diagnostics.push(rewritten);
        } else {
            dropped_diagnostics += 1;
        }
    }

    let mut pruned = document.clone();
    pruned[FILES_KEY] = Value::Array(kept_files);
    pruned[DIAGNOSTICS_KEY] = Value::Array(kept_diagnostics);

    Ok(PrunedDocument {
        document: pruned,
        dropped_files,
        dropped_diagnostics,
    })
}

/// Recursively rewrites every file-reference field in `node` through
/// `renumber`. Returns false as soon as one unmappable reference is
/// found; the partially rewritten node is discarded by the caller, so
/// the walk does not continue past the first miss.
fn rewrite_file_refs(node: &mut Value, renumber: &BTreeMap<usize, usize>) -> bool {
    match node {
        Value::Object(fields) => {
            for (key, value) in fields.iter_mut() {
                if key == FILE_REF_KEY {
                    if let Some(old) = value.as_u64() {
                        match renumber.get(&(old as usize)) {
                            Some(new) => *value = Value::from(*new as u64),
                            None => return false,
                        }
                        continue;
                    }
                }
                if !rewrite_file_refs(value, renumber) {
                    return false;
                }
            }
            true
        }
        Value::Array(items) => items.iter_mut().all(|item| rewrite_file_refs(item, renumber)),
        // Scalars carry no file references.
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
    }
}
