//! Fuzz target for document parsing, normalization and pruning.
//!
//! Arbitrary bytes must never panic the ingestion path: parse errors
//! and structural defects surface as per-document failures.

#![no_main]

use libfuzzer_sys::fuzz_target;

use reportdiff_core::{
    normalize_document, InMemorySource, JsonParser, NormalizeOptions, ReportParser,
};
use reportdiff_domain::prune;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 16384 {
        return;
    }

    let Ok(raw) = JsonParser.parse("/fuzz/doc.json", text) else {
        return;
    };

    let source = InMemorySource::new();
    let _ = normalize_document(&raw, "/fuzz/doc.json", &NormalizeOptions::default(), &source);

    // Pruning must either fail cleanly or keep references valid.
    if let Ok(pruned) = prune(&raw, |path| path.len() % 2 == 0) {
        let _ = pruned.document.to_string();
    }
});
