//! Data types (document model + findings) for reportdiff.
//!
//! This crate is intentionally "dumb": pure DTOs with serde + schemars.
//! Behavior lives in `reportdiff-domain`, `reportdiff-diff` and
//! `reportdiff-core`; the types here only guarantee structural validity.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Well-Known Document Keys ───────────────────────────────────
/// Top-level key holding the ordered file table.
pub const FILES_KEY: &str = "files";
/// Top-level key holding the ordered diagnostic records.
pub const DIAGNOSTICS_KEY: &str = "diagnostics";
/// Diagnostic key holding the bug path (handled separately from the
/// "main" attribute set).
pub const BUG_PATH_KEY: &str = "path";
/// Diagnostic key holding the precomputed identity. Optional: older
/// producers do not emit it.
pub const REPORT_HASH_KEY: &str = "report_hash";
/// Diagnostic key holding the checker name. Optional in older producer
/// versions.
pub const CHECKER_KEY: &str = "checker";
/// Key of a file-reference field anywhere inside a diagnostic.
pub const FILE_REF_KEY: &str = "file";

/// Checker name substituted when a producer did not record one.
pub const UNKNOWN_CHECKER_NAME: &str = "unknown";

// ── Review Status ──────────────────────────────────────────────

/// Human review verdict attached to a finding, either through a
/// persistent hash-keyed rule or an in-source annotation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Unreviewed,
    Confirmed,
    FalsePositive,
    Intentional,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Unreviewed => "unreviewed",
            ReviewStatus::Confirmed => "confirmed",
            ReviewStatus::FalsePositive => "false_positive",
            ReviewStatus::Intentional => "intentional",
        }
    }
}

/// A persistent, hash-keyed review rule.
///
/// Not associated with any specific comparison: once created it affects
/// every finding carrying `hash`, in any collection, past or future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewStatusRule {
    pub hash: String,
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Review verdict recovered from a source-code comment at ingestion
/// time. Lower priority than a [`ReviewStatusRule`] for the same hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceAnnotation {
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

// ── Identity ───────────────────────────────────────────────────

/// Version tag of the identity-hash algorithm.
///
/// The version travels with every persisted hash so historical
/// collections remain comparable to themselves even if the algorithm
/// changes. Hashes from different versions are not comparable without
/// explicit re-hashing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum HashVersion {
    /// Content of the addressed source line plus the relative shape of
    /// the bug path (control-edge columns, event columns).
    PathContext,
    /// Content of the addressed source line only, whitespace-stripped;
    /// independent of the bug path.
    ContextFree,
}

impl HashVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            HashVersion::PathContext => "path_context",
            HashVersion::ContextFree => "context_free",
        }
    }
}

/// Content-derived identity of a finding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    /// Lowercase hex digest. Empty when hash computation failed; such
    /// findings never correlate across runs.
    pub hash: String,
    pub version: HashVersion,
}

// ── Document Model ─────────────────────────────────────────────

/// One row of a document's file table. `index` is positional and stable
/// only within one document instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceFile {
    pub index: usize,
    pub path: String,
}

/// A source position inside a document: 1-based line/column plus the
/// document-scoped file-table index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Location {
    pub line: u64,
    pub col: u64,
    /// Index into the owning document's file table.
    pub file: usize,
}

/// A control-flow step between two source ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Edge {
    pub start: (Location, Location),
    pub end: (Location, Location),
}

/// Kind discriminator of a bug-path element. The set is open: producers
/// add kinds over time, so unknown strings round-trip via `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElementKind {
    Event,
    Control,
    MacroExpansion,
    Note,
    Other(String),
}

impl PathElementKind {
    pub fn as_str(&self) -> &str {
        match self {
            PathElementKind::Event => "event",
            PathElementKind::Control => "control",
            PathElementKind::MacroExpansion => "macro_expansion",
            PathElementKind::Note => "note",
            PathElementKind::Other(s) => s,
        }
    }
}

impl From<String> for PathElementKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "event" => PathElementKind::Event,
            "control" => PathElementKind::Control,
            "macro_expansion" => PathElementKind::MacroExpansion,
            "note" => PathElementKind::Note,
            _ => PathElementKind::Other(s),
        }
    }
}

impl Serialize for PathElementKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PathElementKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(String::deserialize(deserializer)?.into())
    }
}

impl JsonSchema for PathElementKind {
    fn schema_name() -> String {
        "PathElementKind".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// One step of a diagnostic's bug path.
///
/// Order within a diagnostic is execution/control order and must be
/// preserved end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PathElement {
    pub kind: PathElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<(Location, Location)>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl PathElement {
    /// First source position this element addresses, if any.
    pub fn begin(&self) -> Option<(u64, u64)> {
        self.location
            .map(|l| (l.line, l.col))
            .or_else(|| self.ranges.first().map(|(a, _)| (a.line, a.col)))
            .or_else(|| {
                self.edges
                    .first()
                    .map(|e| (e.start.0.line, e.start.0.col))
            })
    }

    /// Last source position this element addresses, if any.
    pub fn end(&self) -> Option<(u64, u64)> {
        self.location
            .map(|l| (l.line, l.col))
            .or_else(|| self.ranges.last().map(|(_, b)| (b.line, b.col)))
            .or_else(|| self.edges.last().map(|e| (e.end.1.line, e.end.1.col)))
    }
}

/// Bug-path start/end position of a finding, used to tell apart
/// distinct findings whose identity hashes collide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct PathPosition {
    pub start: (u64, u64),
    pub end: (u64, u64),
}

// ── Finding ────────────────────────────────────────────────────

/// A normalized diagnostic. Immutable once its identity is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub checker_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Index of the primary location's file in the owning document's
    /// file table.
    pub file_index: usize,
    /// Resolved path of the primary location's file.
    pub file_path: String,
    pub identity: Identity,
    /// Ordered bug path; order is semantically meaningful.
    pub bug_path: Vec<PathElement>,
    /// The diagnostic's "main" attribute set: every top-level field of
    /// the raw record verbatim, except the bug path.
    pub main: BTreeMap<String, serde_json::Value>,
    /// Review verdict recovered from a source comment at ingestion
    /// time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_annotation: Option<SourceAnnotation>,
}

impl Finding {
    /// Bug-path start/end position, falling back through location,
    /// range and edge data of the first/last elements that carry any.
    pub fn path_position(&self) -> PathPosition {
        let start = self
            .bug_path
            .iter()
            .find_map(PathElement::begin)
            .unwrap_or((0, 0));
        let end = self
            .bug_path
            .iter()
            .rev()
            .find_map(PathElement::end)
            .unwrap_or((0, 0));
        PathPosition { start, end }
    }
}

// ── Diff Classification ────────────────────────────────────────

/// Classification of a finding relative to a baseline collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Present in the candidate, hash unknown to the baseline.
    New,
    /// Present in the baseline, hash absent from the candidate.
    Resolved,
    /// Hash present in both collections.
    Unresolved,
}

impl DiffStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DiffStatus::New => "new",
            DiffStatus::Resolved => "resolved",
            DiffStatus::Unresolved => "unresolved",
        }
    }
}
