//! In-source review annotation parsing.
//!
//! Developers can attach a review verdict to a report directly in the
//! analyzed source, in any comment immediately above the reported
//! line:
//!
//! ```text
//! // reportdiff_suppress [core.DivideByZero] fixed upstream
//! // reportdiff_confirmed [*] affects every checker on this line
//! // reportdiff_intentional [core.A, core.B] known trade-off
//! ```
//!
//! `reportdiff_false_positive` is an alias of `reportdiff_suppress`.
//! The bracketed checker list is mandatory; `*` or `all` matches every
//! checker. Annotations are evaluated at ingestion time and recorded
//! on the finding; a persistent hash-keyed review rule takes priority
//! over them later.

use std::collections::BTreeSet;

use reportdiff_types::{ReviewStatus, SourceAnnotation};

const DIRECTIVE_PREFIX: &str = "reportdiff_";

/// Directive keywords, longest first so prefixes cannot shadow.
const KEYWORDS: &[(&str, ReviewStatus)] = &[
    ("false_positive", ReviewStatus::FalsePositive),
    ("intentional", ReviewStatus::Intentional),
    ("confirmed", ReviewStatus::Confirmed),
    ("suppress", ReviewStatus::FalsePositive),
];

/// A parsed review directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDirective {
    pub status: ReviewStatus,
    /// Checker names this directive applies to; `None` is a wildcard.
    pub checkers: Option<BTreeSet<String>>,
    pub message: String,
}

impl AnnotationDirective {
    pub fn applies_to(&self, checker: &str) -> bool {
        match &self.checkers {
            None => true,
            Some(names) => names.contains(checker),
        }
    }
}

/// Multiple directives apply to one report; the annotation is rejected
/// rather than picking one arbitrarily.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{count} review annotations apply to checker '{checker}' above line {line}")]
pub struct AmbiguousAnnotation {
    pub count: usize,
    pub checker: String,
    pub line: u64,
}

/// Parses a single line for a review directive.
///
/// Returns `None` when the line carries no directive, or carries one
/// that is malformed (missing checker list).
pub fn parse_directive(line: &str) -> Option<AnnotationDirective> {
    let lower = line.to_ascii_lowercase();
    let prefix_start = lower.find(DIRECTIVE_PREFIX)?;
    let after_prefix = &line[prefix_start + DIRECTIVE_PREFIX.len()..];

    let (rest, status) = KEYWORDS.iter().find_map(|(keyword, status)| {
        strip_prefix_ci(after_prefix, keyword).map(|rest| (rest, *status))
    })?;

    let rest = rest.trim_start();
    let inner = rest.strip_prefix('[')?;
    let close = inner.find(']')?;
    let (list, tail) = (&inner[..close], &inner[close + 1..]);

    let checkers = parse_checker_list(list)?;
    let message = tail
        .trim()
        .strip_suffix("*/")
        .unwrap_or(tail.trim())
        .trim()
        .to_string();

    Some(AnnotationDirective {
        status,
        checkers,
        message,
    })
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// `Ok(None)`-style tri-state packed into `Option<Option<..>>`:
/// outer `None` means the list itself is invalid (empty).
fn parse_checker_list(list: &str) -> Option<Option<BTreeSet<String>>> {
    let mut names = BTreeSet::new();
    for part in list.split(',') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        if name == "*" || name.eq_ignore_ascii_case("all") {
            return Some(None);
        }
        names.insert(name.to_string());
    }
    if names.is_empty() {
        // A directive with no checkers is a spelling mistake, not a
        // wildcard; ignore it rather than suppressing everything.
        None
    } else {
        Some(Some(names))
    }
}

/// Collects every directive in the contiguous comment block
/// immediately above `report_line` (1-based).
pub fn directives_above(text: &str, report_line: u64) -> Vec<AnnotationDirective> {
    let lines: Vec<&str> = text.lines().collect();
    if report_line < 2 {
        return Vec::new();
    }

    let mut directives = Vec::new();
    let mut index = (report_line - 2) as usize;
    loop {
        let Some(line) = lines.get(index) else { break };
        if !is_comment_like(line) {
            break;
        }
        if let Some(directive) = parse_directive(line) {
            directives.push(directive);
        }
        if index == 0 {
            break;
        }
        index -= 1;
    }
    directives
}

fn is_comment_like(line: &str) -> bool {
    let trimmed = line.trim_start();
    ["//", "/*", "*", "#"]
        .iter()
        .any(|marker| trimmed.starts_with(marker))
}

/// Resolves the in-source annotation for a report at `report_line`
/// raised by `checker`.
///
/// Exactly one applicable directive yields an annotation; none yields
/// `Ok(None)`; more than one is ambiguous and rejected.
pub fn annotation_for_report(
    text: &str,
    report_line: u64,
    checker: &str,
) -> Result<Option<SourceAnnotation>, AmbiguousAnnotation> {
    let applicable: Vec<AnnotationDirective> = directives_above(text, report_line)
        .into_iter()
        .filter(|d| d.applies_to(checker))
        .collect();

    match applicable.len() {
        0 => Ok(None),
        1 => {
            let directive = applicable.into_iter().next().expect("one directive");
            Ok(Some(SourceAnnotation {
                status: directive.status,
                message: directive.message,
            }))
        }
        count => Err(AmbiguousAnnotation {
            count,
            checker: checker.to_string(),
            line: report_line,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parse_directive tests ====================

    #[test]
    fn parse_suppress_single_checker() {
        let d = parse_directive("// reportdiff_suppress [core.DivideByZero] fixed upstream")
            .expect("should parse");
        assert_eq!(d.status, ReviewStatus::FalsePositive);
        assert!(d.applies_to("core.DivideByZero"));
        assert!(!d.applies_to("core.NullDereference"));
        assert_eq!(d.message, "fixed upstream");
    }

    #[test]
    fn parse_false_positive_alias() {
        let d = parse_directive("// reportdiff_false_positive [core.X]").expect("should parse");
        assert_eq!(d.status, ReviewStatus::FalsePositive);
        assert_eq!(d.message, "");
    }

    #[test]
    fn parse_confirmed_and_intentional() {
        let c = parse_directive("// reportdiff_confirmed [core.X] real bug").expect("parse");
        assert_eq!(c.status, ReviewStatus::Confirmed);

        let i = parse_directive("// reportdiff_intentional [core.X] by design of the protocol")
            .expect("parse");
        assert_eq!(i.status, ReviewStatus::Intentional);
    }

    #[test]
    fn parse_multiple_checkers() {
        let d = parse_directive("// reportdiff_suppress [core.A, core.B , core.C] msg")
            .expect("should parse");
        assert!(d.applies_to("core.A"));
        assert!(d.applies_to("core.B"));
        assert!(d.applies_to("core.C"));
        assert!(!d.applies_to("core.D"));
    }

    #[test]
    fn parse_wildcard_star_and_all() {
        let star = parse_directive("// reportdiff_suppress [*] everything").expect("parse");
        assert!(star.applies_to("any.checker"));

        let all = parse_directive("// reportdiff_suppress [ALL] everything").expect("parse");
        assert!(all.applies_to("any.checker"));
    }

    #[test]
    fn parse_is_case_insensitive_on_the_directive() {
        let d = parse_directive("// REPORTDIFF_SUPPRESS [core.X]").expect("should parse");
        assert_eq!(d.status, ReviewStatus::FalsePositive);
    }

    #[test]
    fn parse_inside_block_comment_strips_closer() {
        let d = parse_directive("/* reportdiff_suppress [core.X] not a real issue */")
            .expect("should parse");
        assert_eq!(d.message, "not a real issue");
    }

    #[test]
    fn parse_rejects_missing_checker_list() {
        assert!(parse_directive("// reportdiff_suppress no brackets").is_none());
        assert!(parse_directive("// reportdiff_suppress [] msg").is_none());
        assert!(parse_directive("// reportdiff_suppress [ , ] msg").is_none());
    }

    #[test]
    fn parse_rejects_unrelated_comments() {
        assert!(parse_directive("// an ordinary comment").is_none());
        assert!(parse_directive("let x = 1;").is_none());
        assert!(parse_directive("// reportdiff_ but nothing else").is_none());
    }

    // ==================== annotation_for_report tests ====================

    const SOURCE: &str = "\
int foo(int z) {
  // reportdiff_suppress [core.DivideByZero] verified nonzero
  return 42 / z;
}
";

    #[test]
    fn annotation_applies_to_the_line_below() {
        let annotation = annotation_for_report(SOURCE, 3, "core.DivideByZero")
            .expect("unambiguous")
            .expect("annotated");
        assert_eq!(annotation.status, ReviewStatus::FalsePositive);
        assert_eq!(annotation.message, "verified nonzero");
    }

    #[test]
    fn annotation_ignores_other_checkers() {
        let annotation =
            annotation_for_report(SOURCE, 3, "core.NullDereference").expect("unambiguous");
        assert!(annotation.is_none());
    }

    #[test]
    fn annotation_ignores_other_lines() {
        let annotation =
            annotation_for_report(SOURCE, 1, "core.DivideByZero").expect("unambiguous");
        assert!(annotation.is_none());
    }

    #[test]
    fn annotation_spans_a_comment_block() {
        let source = "\
int foo(int z) {
  // The divisor is validated by the caller.
  // reportdiff_intentional [core.DivideByZero]
  // See the contract of foo().
  return 42 / z;
}
";
        let annotation = annotation_for_report(source, 5, "core.DivideByZero")
            .expect("unambiguous")
            .expect("annotated");
        assert_eq!(annotation.status, ReviewStatus::Intentional);
    }

    #[test]
    fn conflicting_directives_are_ambiguous() {
        let source = "\
// reportdiff_suppress [core.X] one
// reportdiff_confirmed [core.X] two
int bad;
";
        let err = annotation_for_report(source, 3, "core.X").unwrap_err();
        assert_eq!(err.count, 2);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn block_scan_stops_at_code() {
        let source = "\
// reportdiff_suppress [core.X] detached
int unrelated;
int bad;
";
        // The directive is separated from line 3 by a code line, so it
        // does not apply.
        let annotation = annotation_for_report(source, 3, "core.X").expect("unambiguous");
        assert!(annotation.is_none());
    }

    #[test]
    fn report_on_first_line_has_no_annotation() {
        let annotation = annotation_for_report("int x;\n", 1, "core.X").expect("unambiguous");
        assert!(annotation.is_none());
    }
}
