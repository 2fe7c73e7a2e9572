//! Property-based tests for reportdiff-diff.
//!
//! The diff must be a clean partition: symmetric under argument swap,
//! exhaustive over both collections, and stable under re-ingestion of
//! duplicates.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use proptest::prelude::*;

use reportdiff_diff::{diff, FindingCollection};
use reportdiff_types::{
    Finding, HashVersion, Identity, Location, PathElement, PathElementKind,
};

/// A small hash alphabet so collections overlap often.
fn arb_hash() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"])
        .prop_map(str::to_string)
}

fn arb_finding() -> impl Strategy<Value = Finding> {
    (arb_hash(), 1u64..30, 1u64..10, prop::sample::select(vec!["/a.cpp", "/b.cpp"]))
        .prop_map(|(hash, line, col, file)| Finding {
            checker_name: "core.DivideByZero".to_string(),
            category: None,
            report_type: None,
            severity: None,
            file_index: 0,
            file_path: file.to_string(),
            identity: Identity {
                hash,
                version: HashVersion::PathContext,
            },
            bug_path: vec![PathElement {
                kind: PathElementKind::Event,
                location: Some(Location { line, col, file: 0 }),
                edges: vec![],
                ranges: vec![],
                message: "evt".to_string(),
            }],
            main: BTreeMap::new(),
            source_annotation: None,
        })
}

fn arb_collection() -> impl Strategy<Value = FindingCollection> {
    prop::collection::vec(arb_finding(), 0..12)
        .prop_map(|findings| findings.into_iter().collect())
}

proptest! {
    /// Swapping baseline and candidate swaps new and resolved and
    /// leaves the unresolved hash set unchanged.
    #[test]
    fn diff_is_symmetric(a in arb_collection(), b in arb_collection()) {
        let forward = diff(&a, &b);
        let backward = diff(&b, &a);

        prop_assert_eq!(forward.new_hashes(), backward.resolved_hashes());
        prop_assert_eq!(forward.resolved_hashes(), backward.new_hashes());
        prop_assert_eq!(forward.unresolved_hashes(), backward.unresolved_hashes());
    }

    /// Every candidate finding is classified exactly once (new or
    /// unresolved), every baseline finding at most once (resolved).
    #[test]
    fn diff_is_an_exhaustive_partition(a in arb_collection(), b in arb_collection()) {
        let outcome = diff(&a, &b);

        prop_assert_eq!(outcome.new.len() + outcome.unresolved.len(), b.len());

        let resolved_hashes = outcome.resolved_hashes();
        let baseline_only: BTreeSet<&str> = a
            .hashes()
            .iter()
            .filter(|h| !b.contains_hash(h))
            .map(String::as_str)
            .collect();
        prop_assert_eq!(resolved_hashes, baseline_only);

        // New hashes are unknown to the baseline; unresolved hashes
        // are known to both sides.
        for hash in outcome.new_hashes() {
            prop_assert!(!a.contains_hash(hash));
        }
        for hash in outcome.unresolved_hashes() {
            prop_assert!(a.contains_hash(hash) && b.contains_hash(hash));
        }
    }

    /// Diffing a collection against itself yields no churn.
    #[test]
    fn self_diff_is_all_unresolved(a in arb_collection()) {
        let outcome = diff(&a, &a);
        prop_assert!(outcome.new.is_empty());
        prop_assert!(outcome.resolved.is_empty());
        prop_assert_eq!(outcome.unresolved.len(), a.len());
    }

    /// Re-ingesting the same findings never grows a collection.
    #[test]
    fn ingestion_is_idempotent(a in arb_collection()) {
        let mut again = FindingCollection::new();
        again.ingest_all(a.findings().iter().cloned());
        let before = again.len();
        again.ingest_all(a.findings().iter().cloned());
        prop_assert_eq!(again.len(), before);
    }
}
