//! Domain logic: path filtering, document pruning + review overlay.
//!
//! This crate is designed to be I/O-free and highly testable.

pub mod annotations;
pub mod prune;
pub mod review;
pub mod skipfile;

pub use annotations::{
    AmbiguousAnnotation, AnnotationDirective, annotation_for_report, directives_above,
    parse_directive,
};
pub use prune::{PruneError, PrunedDocument, prune};
pub use review::{InMemoryRuleStore, ReviewRuleStore, effective_status};
pub use skipfile::{DroppedLine, RuleSign, SkipFilter, SkipRule, SkipfileReport};
