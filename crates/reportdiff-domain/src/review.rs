//! Review-status overlay.
//!
//! Persistent, hash-keyed review rules override whatever a finding
//! carried from ingestion. The rule index is not scoped to any run or
//! comparison: a rule created after a baseline was captured still
//! applies when that baseline is re-evaluated later, because lookup is
//! keyed purely by identity hash.

use std::collections::BTreeMap;

use reportdiff_types::{Finding, ReviewStatus, ReviewStatusRule};

/// Pure lookup interface over the current review-rule table snapshot.
/// Rule creation and removal belong to an external collaborator.
pub trait ReviewRuleStore {
    fn rule_for(&self, hash: &str) -> Option<&ReviewStatusRule>;
}

/// Hash-keyed rule table held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleStore {
    rules: BTreeMap<String, ReviewStatusRule>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the rule for its hash.
    pub fn insert(&mut self, rule: ReviewStatusRule) {
        self.rules.insert(rule.hash.clone(), rule);
    }

    pub fn remove(&mut self, hash: &str) -> Option<ReviewStatusRule> {
        self.rules.remove(hash)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl ReviewRuleStore for InMemoryRuleStore {
    fn rule_for(&self, hash: &str) -> Option<&ReviewStatusRule> {
        self.rules.get(hash)
    }
}

/// The status a finding is displayed and filtered under.
///
/// Priority: hash-keyed rule, then the in-source annotation recorded
/// at ingestion, then `Unreviewed`.
pub fn effective_status(finding: &Finding, store: &dyn ReviewRuleStore) -> ReviewStatus {
    if let Some(rule) = store.rule_for(&finding.identity.hash) {
        return rule.status;
    }
    finding
        .source_annotation
        .as_ref()
        .map(|annotation| annotation.status)
        .unwrap_or(ReviewStatus::Unreviewed)
}
