//! Property-based tests for reportdiff-core.
//!
//! The central invariant: identity hashes survive line-number drift
//! caused by edits far away from the addressed lines, for arbitrary
//! sources, positions and inserted content.

use proptest::prelude::*;

use reportdiff_core::{
    context_free_hash, normalize_document, path_context_hash, InMemorySource, NormalizeOptions,
};
use reportdiff_types::{Location, PathElement, PathElementKind};

const FILE: &str = "/src/unit.cpp";

fn event(line: u64, col: u64, message: &str) -> PathElement {
    PathElement {
        kind: PathElementKind::Event,
        location: Some(Location { line, col, file: 0 }),
        edges: vec![],
        ranges: vec![],
        message: message.to_string(),
    }
}

/// Lines of plausible source text; no leading/trailing whitespace so
/// trimming cannot make distinct lines collide trivially.
fn arb_line() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9 =+*/;()]{0,24}").expect("valid regex")
}

/// A source body, an addressed line inside it, and unrelated lines to
/// insert above the addressed line.
fn arb_drift_case() -> impl Strategy<Value = (Vec<String>, u64, Vec<String>)> {
    prop::collection::vec(arb_line(), 3..12).prop_flat_map(|lines| {
        let len = lines.len() as u64;
        (
            Just(lines),
            2..=len,
            prop::collection::vec(arb_line(), 1..5),
        )
    })
}

proptest! {
    /// Inserting unrelated lines above the addressed line shifts the
    /// report but not its path-context identity.
    #[test]
    fn path_context_hash_survives_line_drift(
        (lines, report_line, inserted) in arb_drift_case(),
    ) {
        let original = InMemorySource::new().with_file(FILE, lines.join("\n"));

        let mut shifted_lines = inserted.clone();
        shifted_lines.extend(lines.clone());
        let shifted_source = InMemorySource::new().with_file(FILE, shifted_lines.join("\n"));

        let shift = inserted.len() as u64;
        let path = vec![
            event(report_line - 1, 3, "step"),
            event(report_line, 7, "boom"),
        ];
        let shifted_path = vec![
            event(report_line - 1 + shift, 3, "step"),
            event(report_line + shift, 7, "boom"),
        ];

        let h1 = path_context_hash(&path, FILE, "core.X", &original).expect("hash");
        let h2 = path_context_hash(&shifted_path, FILE, "core.X", &shifted_source)
            .expect("hash");
        prop_assert_eq!(h1, h2);
    }

    /// The context-free identity is invariant under whitespace
    /// insertion anywhere before the addressed column.
    #[test]
    fn context_free_hash_ignores_inserted_whitespace(
        line in arb_line(),
        col in 1u64..20,
        pad in 1usize..6,
    ) {
        let source = InMemorySource::new().with_file(FILE, line.clone());

        let insert_at = (col as usize - 1).min(line.chars().count());
        let padded: String = line
            .chars()
            .take(insert_at)
            .chain(std::iter::repeat(' ').take(pad))
            .chain(line.chars().skip(insert_at))
            .collect();
        let padded_source = InMemorySource::new().with_file(FILE, padded);

        let h1 = context_free_hash(
            &Location { line: 1, col, file: 0 },
            "message",
            FILE,
            &source,
        );
        let h2 = context_free_hash(
            &Location { line: 1, col: col + pad as u64, file: 0 },
            "message",
            FILE,
            &padded_source,
        );
        prop_assert_eq!(h1, h2);
    }

    /// Normalization is deterministic: the same document yields the
    /// same findings, identities included.
    #[test]
    fn normalization_is_deterministic(
        (lines, report_line, _) in arb_drift_case(),
    ) {
        let source = InMemorySource::new().with_file(FILE, lines.join("\n"));
        let document = serde_json::json!({
            "files": [FILE],
            "diagnostics": [{
                "checker": "core.X",
                "location": {"line": report_line, "col": 2, "file": 0},
                "path": [
                    {"kind": "event",
                     "location": {"line": report_line, "col": 2, "file": 0},
                     "message": "boom"}
                ]
            }]
        });

        let options = NormalizeOptions::default();
        let first = normalize_document(&document, "/r/a.json", &options, &source)
            .expect("normalize");
        let second = normalize_document(&document, "/r/a.json", &options, &source)
            .expect("normalize");

        prop_assert_eq!(first.findings, second.findings);
        prop_assert!(first.needs_rewrite);
    }
}
