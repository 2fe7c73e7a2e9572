//! Two-collection diff classification keyed by identity hash.
//!
//! Findings land in a [`FindingCollection`], which deduplicates at
//! ingestion time: equal hash plus equal bug-path start/end position
//! in the same file is one logical finding. [`diff`] then partitions
//! the candidate/baseline pair into new, resolved and unresolved
//! findings by hash-set membership.
//!
//! Hash collisions (same hash, different position) are kept as
//! distinct findings and each is classified independently by the same
//! hash-equality rule. That is an accepted ambiguity of hash-only
//! correlation, never an error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use reportdiff_types::{DiffStatus, Finding, PathPosition};

/// Deduplicated set of findings forming one side of a comparison.
#[derive(Debug, Clone, Default)]
pub struct FindingCollection {
    findings: Vec<Finding>,
    hashes: BTreeSet<String>,
    seen: BTreeSet<(String, String, PathPosition)>,
}

impl FindingCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finding, collapsing duplicates.
    ///
    /// Two findings are the same iff their hash, file and bug-path
    /// start/end position all agree; the first occurrence wins.
    /// Returns false when the finding was a duplicate.
    pub fn ingest(&mut self, finding: Finding) -> bool {
        let key = (
            finding.identity.hash.clone(),
            finding.file_path.clone(),
            finding.path_position(),
        );
        if !self.seen.insert(key) {
            return false;
        }
        self.hashes.insert(finding.identity.hash.clone());
        self.findings.push(finding);
        true
    }

    /// Ingests every finding, returning how many were kept.
    pub fn ingest_all(&mut self, findings: impl IntoIterator<Item = Finding>) -> usize {
        findings
            .into_iter()
            .filter(|f| self.ingest(f.clone()))
            .count()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn contains_hash(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn hashes(&self) -> &BTreeSet<String> {
        &self.hashes
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

impl FromIterator<Finding> for FindingCollection {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        let mut collection = FindingCollection::new();
        collection.ingest_all(iter);
        collection
    }
}

/// Result of diffing a candidate collection against a baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffOutcome {
    /// Candidate findings whose hash has no match in the baseline.
    pub new: Vec<Finding>,
    /// Baseline findings whose hash has no match in the candidate.
    pub resolved: Vec<Finding>,
    /// Candidate findings whose hash appears on both sides.
    pub unresolved: Vec<Finding>,
}

impl DiffOutcome {
    pub fn new_hashes(&self) -> BTreeSet<&str> {
        self.new.iter().map(|f| f.identity.hash.as_str()).collect()
    }

    pub fn resolved_hashes(&self) -> BTreeSet<&str> {
        self.resolved
            .iter()
            .map(|f| f.identity.hash.as_str())
            .collect()
    }

    pub fn unresolved_hashes(&self) -> BTreeSet<&str> {
        self.unresolved
            .iter()
            .map(|f| f.identity.hash.as_str())
            .collect()
    }
}

/// Classifies one finding from `side` against the other collection.
pub fn classify(finding: &Finding, other: &FindingCollection, side: DiffSide) -> DiffStatus {
    let matched = other.contains_hash(&finding.identity.hash);
    match (side, matched) {
        (DiffSide::Candidate, false) => DiffStatus::New,
        (DiffSide::Baseline, false) => DiffStatus::Resolved,
        (_, true) => DiffStatus::Unresolved,
    }
}

/// Which collection a finding belongs to during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSide {
    Baseline,
    Candidate,
}

/// Partitions two finding collections by identity hash.
///
/// The diff is symmetric in information content but asymmetric in
/// naming: swapping the arguments swaps `new` and `resolved` and
/// leaves the unresolved hash set unchanged. Unresolved findings are
/// reported from the candidate side (the instances that still exist).
pub fn diff(baseline: &FindingCollection, candidate: &FindingCollection) -> DiffOutcome {
    let mut outcome = DiffOutcome::default();

    for finding in candidate.findings() {
        match classify(finding, baseline, DiffSide::Candidate) {
            DiffStatus::New => outcome.new.push(finding.clone()),
            _ => outcome.unresolved.push(finding.clone()),
        }
    }

    for finding in baseline.findings() {
        if classify(finding, candidate, DiffSide::Baseline) == DiffStatus::Resolved {
            outcome.resolved.push(finding.clone());
        }
    }

    outcome
}
