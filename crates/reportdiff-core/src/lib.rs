//! Core engine: report ingestion + identity hashing + diff evaluation.
//!
//! The data flow mirrors how collections move through the aggregation
//! tool: a raw document is parsed by a [`ReportParser`], normalized
//! into findings (each receiving an identity hash if the producer left
//! it out), optionally filtered through a skip filter, and two such
//! collections are then classified by the diff engine with the
//! review-status overlay applied to the result.

mod adapter;
mod evaluate;
mod hash;
mod normalize;
mod source;

pub use adapter::{AdapterError, JsonParser, ReportParser};
pub use evaluate::{collect_findings, evaluate_diff, DiffDirection, DiffQuery};
pub use hash::{context_free_hash, path_context_hash, HashError};
pub use normalize::{
    normalize_batch, normalize_batch_parallel, normalize_document, normalize_file,
    rewrite_with_identities, BatchOutcome, DocumentFailure, NormalizeIssue, NormalizeOptions,
    NormalizedDocument,
};
pub use source::{FileSystemSource, InMemorySource, SourceAccess};
