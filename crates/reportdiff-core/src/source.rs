//! Source-line access for identity hashing and annotation lookup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Read access to the analyzed sources.
///
/// Implementations must be cheap to call repeatedly: the hasher asks
/// for one line per diagnostic and the annotation scanner for whole
/// files.
pub trait SourceAccess: Sync {
    /// The given 1-based line, or `""` when the line is out of range
    /// or the file cannot be read. The empty-string fallback is part
    /// of the hash contract: historical hashes depend on it.
    fn line(&self, path: &str, line: u64) -> String;

    /// The whole file, if readable.
    fn text(&self, path: &str) -> Option<String>;
}

/// Filesystem-backed source access with a per-file content cache.
///
/// Files are decoded as UTF-8 lossily; the decoding strategy feeds the
/// identity hash and must not change between releases.
#[derive(Debug, Default)]
pub struct FileSystemSource {
    cache: Mutex<HashMap<PathBuf, Option<String>>>,
}

impl FileSystemSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn cached_text(&self, path: &str) -> Option<String> {
        let key = PathBuf::from(path);
        let mut cache = self.cache.lock().expect("source cache poisoned");
        cache
            .entry(key)
            .or_insert_with(|| {
                std::fs::read(path)
                    .ok()
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            })
            .clone()
    }
}

impl SourceAccess for FileSystemSource {
    fn line(&self, path: &str, line: u64) -> String {
        if line == 0 {
            return String::new();
        }
        match self.cached_text(path) {
            Some(text) => text
                .lines()
                .nth((line - 1) as usize)
                .unwrap_or("")
                .to_string(),
            None => String::new(),
        }
    }

    fn text(&self, path: &str) -> Option<String> {
        self.cached_text(path)
    }
}

/// In-memory source tree, for callers that already hold the analyzed
/// file contents (and for tests).
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    files: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl SourceAccess for InMemorySource {
    fn line(&self, path: &str, line: u64) -> String {
        if line == 0 {
            return String::new();
        }
        self.files
            .get(path)
            .and_then(|text| text.lines().nth((line - 1) as usize))
            .unwrap_or("")
            .to_string()
    }

    fn text(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}
