//! Identity-hash computation.
//!
//! A finding's identity must survive line-number drift: inserting or
//! deleting unrelated lines elsewhere in a file, or whitespace-only
//! edits outside the addressed lines, must not change it. It must
//! change when the checker, the addressed line's text, or the relative
//! shape of the bug path changes.
//!
//! Two versioned algorithms are provided (see
//! [`reportdiff_types::HashVersion`]); the version travels with every
//! persisted hash, and hashes from different versions are never
//! comparable.

use sha2::{Digest, Sha256};

use reportdiff_types::{Location, PathElement, PathElementKind};

use crate::source::SourceAccess;

/// Separator between hashed content pieces. Changing it invalidates
/// every persisted hash.
const PIECE_SEPARATOR: &str = "|||";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("bug path is empty")]
    EmptyBugPath,
    #[error("main bug-path element has no location")]
    MissingMainLocation,
    #[error("event element used for hashing has no location")]
    MissingEventLocation,
}

fn digest(pieces: &[String]) -> String {
    hex::encode(Sha256::digest(pieces.join(PIECE_SEPARATOR).as_bytes()))
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Path-context identity: derived from the main diagnostic element
/// (the last bug-path entry), the trimmed text of the addressed source
/// line, the checker name, and the column shape of the control-flow
/// path.
///
/// Control columns are collapsed where a step starts exactly where the
/// previous one ended; when any control element carries no edges, the
/// column sequence of the event elements is appended instead.
pub fn path_context_hash(
    bug_path: &[PathElement],
    source_file: &str,
    checker_name: &str,
    source: &dyn SourceAccess,
) -> Result<String, HashError> {
    let main_section = bug_path.last().ok_or(HashError::EmptyBugPath)?;
    let main_loc = main_section.location.ok_or(HashError::MissingMainLocation)?;

    let line_content = source.line(source_file, main_loc.line).trim().to_string();
    if line_content.is_empty() {
        tracing::warn!(
            source_file,
            line = main_loc.line,
            "hashing without source line content"
        );
    }

    let mut pieces = vec![
        file_name(source_file).to_string(),
        checker_name.to_string(),
        main_section.message.clone(),
        line_content,
        main_loc.col.to_string(),
        main_loc.col.to_string(),
    ];

    let controls: Vec<&PathElement> = bug_path
        .iter()
        .filter(|e| e.kind == PathElementKind::Control)
        .collect();

    let mut from_control = true;
    for (i, section) in controls.iter().enumerate() {
        let Some(edge) = section.edges.first() else {
            from_control = false;
            continue;
        };
        let (start_begin, start_end) = (&edge.start.0, &edge.start.1);
        let (end_begin, end_end) = (&edge.end.0, &edge.end.1);

        if i > 0 {
            let Some(prev_edge) = controls[i - 1].edges.first() else {
                from_control = false;
                continue;
            };
            // A step starting exactly where the previous one ended
            // adds no information; only a displaced start contributes
            // its columns.
            if start_begin != &prev_edge.end.0 && start_end != &prev_edge.end.1 {
                pieces.push(start_begin.col.to_string());
                pieces.push(start_end.col.to_string());
            }
        } else {
            pieces.push(start_begin.col.to_string());
            pieces.push(start_end.col.to_string());
        }
        pieces.push(end_begin.col.to_string());
        pieces.push(end_end.col.to_string());
    }

    if !from_control {
        for event in bug_path.iter().filter(|e| e.kind == PathElementKind::Event) {
            let loc = event.location.ok_or(HashError::MissingEventLocation)?;
            pieces.push(loc.col.to_string());
        }
    }

    Ok(digest(&pieces))
}

/// Context-free identity: independent of the bug path, derived only
/// from the addressed line with every whitespace character removed and
/// the column adjusted accordingly.
pub fn context_free_hash(
    location: &Location,
    message: &str,
    source_file: &str,
    source: &dyn SourceAccess,
) -> String {
    let line_content = source.line(source_file, location.line);
    let (stripped, col) = remove_whitespace(&line_content, location.col);

    let pieces = vec![
        file_name(source_file).to_string(),
        message.to_string(),
        stripped,
        col.to_string(),
        col.to_string(),
    ];
    digest(&pieces)
}

/// Removes every whitespace character from `line` and shifts `col` to
/// keep addressing the same character.
fn remove_whitespace(line: &str, col: u64) -> (String, u64) {
    let prefix: String = line.chars().take(col as usize).collect();
    let stripped_prefix: String = prefix.split_whitespace().collect();
    let removed = prefix.chars().count() - stripped_prefix.chars().count();

    let stripped: String = line.split_whitespace().collect();
    (stripped, col.saturating_sub(removed as u64))
}
