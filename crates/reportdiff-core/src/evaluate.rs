//! Diff query evaluation.
//!
//! Combines the diff engine with the review-status overlay: two
//! finding collections are classified first, then the requested status
//! filter is applied to the classified result using each finding's
//! effective status. Filtering never happens before classification.

use std::collections::BTreeSet;

use reportdiff_diff::{diff, DiffOutcome, FindingCollection};
use reportdiff_domain::{effective_status, ReviewRuleStore, SkipFilter};
use reportdiff_types::{Finding, ReviewStatus};

use crate::normalize::BatchOutcome;

/// Which collection plays the baseline role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffDirection {
    /// First argument is the baseline.
    #[default]
    Forward,
    /// Second argument is the baseline; `new` and `resolved` swap.
    Reversed,
}

/// Caller-supplied diff parameters.
#[derive(Debug, Clone, Default)]
pub struct DiffQuery {
    pub direction: DiffDirection,
    /// Keep only findings whose effective status is in this set; an
    /// empty set keeps everything.
    pub statuses: BTreeSet<ReviewStatus>,
}

impl DiffQuery {
    pub fn with_statuses(statuses: impl IntoIterator<Item = ReviewStatus>) -> Self {
        DiffQuery {
            direction: DiffDirection::Forward,
            statuses: statuses.into_iter().collect(),
        }
    }
}

/// Folds a normalization batch into a deduplicated collection,
/// dropping findings whose file is excluded by the skip filter.
pub fn collect_findings(batch: BatchOutcome, skip: Option<&SkipFilter>) -> FindingCollection {
    match skip {
        None => batch.into_collection(),
        Some(filter) => batch
            .documents
            .into_iter()
            .flat_map(|d| d.findings)
            .filter(|f| !filter.should_skip(&f.file_path))
            .collect(),
    }
}

/// Classifies `candidate` against `baseline` (or the reverse, per the
/// query direction) and applies the requested status filter to the
/// classified result.
///
/// The review-rule store is consulted through each finding's identity
/// hash only, so rules apply to both sides identically regardless of
/// when either collection was captured.
pub fn evaluate_diff(
    baseline: &FindingCollection,
    candidate: &FindingCollection,
    query: &DiffQuery,
    store: &dyn ReviewRuleStore,
) -> DiffOutcome {
    let (baseline, candidate) = match query.direction {
        DiffDirection::Forward => (baseline, candidate),
        DiffDirection::Reversed => (candidate, baseline),
    };

    let mut outcome = diff(baseline, candidate);

    if !query.statuses.is_empty() {
        let keep = |f: &Finding| query.statuses.contains(&effective_status(f, store));
        outcome.new.retain(keep);
        outcome.resolved.retain(keep);
        outcome.unresolved.retain(keep);
    }

    outcome
}
