//! Ordered path-exclusion rules ("skipfile").
//!
//! Skipfile format, one rule per line:
//!
//! ```text
//! -/skip/all/source/in/directory*
//! -/do/not/check/this.file
//! +/dir/check.this.file
//! -/dir/*
//! ```
//!
//! `-` excludes, `+` forcibly includes. Evaluation is strictly
//! first-match-wins in load order, so more specific rules must be
//! declared before broader ones; the filter never reorders by
//! specificity. Patterns are anchored prefix matches: a rule matches
//! any path beginning with its glob-expanded prefix.

use std::sync::Arc;

use arc_swap::ArcSwap;
use globset::{Glob, GlobMatcher};

/// Rule polarity: `+` keeps a path, `-` drops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSign {
    Include,
    Exclude,
}

/// One compiled skipfile rule.
#[derive(Debug, Clone)]
pub struct SkipRule {
    pub sign: RuleSign,
    matcher: GlobMatcher,
    /// The original line, sign included.
    pub raw: String,
}

impl SkipRule {
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

/// A line dropped during skipfile parsing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedLine {
    pub line: String,
    pub reason: String,
}

/// Structured outcome of parsing skipfile content. Malformed lines are
/// reported here (and logged at warning level) instead of failing the
/// whole rule set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkipfileReport {
    pub loaded: usize,
    pub dropped: Vec<DroppedLine>,
}

/// Immutable snapshot of a compiled rule set.
#[derive(Debug, Default)]
struct RuleSet {
    rules: Vec<SkipRule>,
    raw_lines: Vec<String>,
}

/// Ordered path filter over skipfile rules.
///
/// `should_skip` readers always observe a complete rule set:
/// [`SkipFilter::overwrite`] swaps in a new immutable snapshot, so a
/// replacement is atomic from the caller's perspective.
pub struct SkipFilter {
    set: ArcSwap<RuleSet>,
}

impl std::fmt::Debug for SkipFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkipFilter")
            .field("rules", &self.set.load().rules)
            .finish()
    }
}

impl Default for SkipFilter {
    fn default() -> Self {
        Self::empty()
    }
}

impl SkipFilter {
    /// A filter with no rules; `should_skip` always returns false.
    pub fn empty() -> Self {
        SkipFilter {
            set: ArcSwap::from_pointee(RuleSet::default()),
        }
    }

    /// Builds a filter from skipfile content. Construction never
    /// fails: malformed lines are dropped and reported.
    pub fn from_content(content: &str) -> (Self, SkipfileReport) {
        let (set, report) = compile_content(content);
        let filter = SkipFilter {
            set: ArcSwap::from_pointee(set),
        };
        (filter, report)
    }

    /// Wholesale replaces the rule set. Concurrent `should_skip`
    /// callers observe either the previous complete set or the new
    /// one, never a partial mix.
    pub fn overwrite(&self, content: &str) -> SkipfileReport {
        let (set, report) = compile_content(content);
        self.set.store(Arc::new(set));
        report
    }

    /// Whether findings for `path` should be dropped.
    ///
    /// Scans rules in load order and stops at the first match; an
    /// empty rule set keeps everything.
    pub fn should_skip(&self, path: &str) -> bool {
        let set = self.set.load();
        for rule in &set.rules {
            if rule.matches(path) {
                return rule.sign == RuleSign::Exclude;
            }
        }
        false
    }

    /// The retained skipfile lines, unchanged, in load order.
    pub fn raw_lines(&self) -> Vec<String> {
        self.set.load().raw_lines.clone()
    }

    pub fn len(&self) -> usize {
        self.set.load().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.load().rules.is_empty()
    }
}

fn compile_content(content: &str) -> (RuleSet, SkipfileReport) {
    let mut rules = Vec::new();
    let mut raw_lines = Vec::new();
    let mut report = SkipfileReport::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        raw_lines.push(line.to_string());

        match compile_line(line) {
            Ok(rule) => {
                rules.push(rule);
                report.loaded += 1;
            }
            Err(reason) => {
                tracing::warn!(line, %reason, "dropping malformed skipfile line");
                report.dropped.push(DroppedLine {
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    (RuleSet { rules, raw_lines }, report)
}

fn compile_line(line: &str) -> Result<SkipRule, String> {
    if line.len() < 2 {
        return Err("line too short".to_string());
    }

    let sign = match line.as_bytes()[0] {
        b'+' => RuleSign::Include,
        b'-' => RuleSign::Exclude,
        _ => return Err("line must start with '+' or '-'".to_string()),
    };

    let pattern = &line[1..];
    // Anchor as a prefix: an implicit trailing wildcard makes the rule
    // match any path beginning with the given glob-expanded prefix.
    let anchored = if pattern.ends_with('*') {
        pattern.to_string()
    } else {
        format!("{pattern}*")
    };

    let matcher = Glob::new(&anchored)
        .map_err(|e| format!("invalid glob pattern: {e}"))?
        .compile_matcher();

    Ok(SkipRule {
        sign,
        matcher,
        raw: line.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_skips_nothing() {
        let filter = SkipFilter::empty();
        assert!(!filter.should_skip("/any/path.cpp"));
        assert!(filter.is_empty());
    }

    #[test]
    fn exclude_rule_drops_matching_prefix() {
        let (filter, report) = SkipFilter::from_content("-/skip/me");
        assert_eq!(report.loaded, 1);
        assert!(filter.should_skip("/skip/me"));
        assert!(filter.should_skip("/skip/me/deeper/file.cpp"));
        assert!(!filter.should_skip("/keep/me.cpp"));
    }

    #[test]
    fn first_match_wins_over_later_more_specific_rule() {
        // The broad exclude is declared first, so it fires before the
        // later, more specific include: order governs, not specificity.
        let (filter, _) = SkipFilter::from_content("-/*\n+/keep.cpp");
        assert!(filter.should_skip("/keep.cpp"));

        // Declared the other way around the include wins.
        let (filter, _) = SkipFilter::from_content("+/keep.cpp\n-/*");
        assert!(!filter.should_skip("/keep.cpp"));
        assert!(filter.should_skip("/other.cpp"));
    }

    #[test]
    fn include_rule_without_match_keeps_default() {
        let (filter, _) = SkipFilter::from_content("+/keep.cpp");
        assert!(!filter.should_skip("/unrelated.cpp"));
    }

    #[test]
    fn glob_star_matches_within_prefix() {
        let (filter, _) = SkipFilter::from_content("-/src/*/generated");
        assert!(filter.should_skip("/src/module/generated/file.cpp"));
        assert!(!filter.should_skip("/src/file.cpp"));
    }

    #[test]
    fn blank_and_comment_lines_are_ignored_silently() {
        let (filter, report) = SkipFilter::from_content("\n# a comment\n-/skip\n\n");
        assert_eq!(report.loaded, 1);
        assert!(report.dropped.is_empty());
        assert_eq!(filter.raw_lines(), vec!["-/skip".to_string()]);
    }

    #[test]
    fn malformed_lines_are_dropped_with_reasons() {
        let (filter, report) = SkipFilter::from_content("-/skip\nbogus\n+\n*/x");
        assert_eq!(report.loaded, 1);
        assert_eq!(report.dropped.len(), 3);
        assert!(filter.should_skip("/skip/file.cpp"));

        let reasons: Vec<String> = report
            .dropped
            .iter()
            .map(|d| format!("{}: {}", d.line, d.reason))
            .collect();
        insta::assert_snapshot!(reasons.join("\n"), @r###"
        bogus: line must start with '+' or '-'
        +: line too short
        */x: line must start with '+' or '-'
        "###);
    }

    #[test]
    fn overwrite_replaces_the_whole_set() {
        let (filter, _) = SkipFilter::from_content("-/old");
        assert!(filter.should_skip("/old/file.cpp"));

        let report = filter.overwrite("-/new");
        assert_eq!(report.loaded, 1);
        assert!(!filter.should_skip("/old/file.cpp"));
        assert!(filter.should_skip("/new/file.cpp"));
        assert_eq!(filter.raw_lines(), vec!["-/new".to_string()]);
    }

    #[test]
    fn retained_lines_include_malformed_ones() {
        // Mirrors the on-disk skipfile for persistence: every
        // non-blank, non-comment line is retained verbatim.
        let (filter, _) = SkipFilter::from_content("-/skip\nbogus");
        assert_eq!(
            filter.raw_lines(),
            vec!["-/skip".to_string(), "bogus".to_string()]
        );
    }
}
