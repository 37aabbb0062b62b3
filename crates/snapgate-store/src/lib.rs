//! Prerendered page store for snapgate.
//!
//! The store maps a canonical request path to the snapshot produced by the
//! prerender phase. It is written once per build and read by every request
//! during serving:
//!
//! - [`PageStore`]: Read-only lookup used by the gateway
//! - [`FileStore`]: Durable, zstd-compressed store on disk with atomic writes
//! - [`MemoryStore`]: In-process store for embedding and tests
//!
//! # Example
//!
//! ```
//! use snapgate_store::{CacheEntry, MemoryStore, PageStore};
//!
//! let store = MemoryStore::new();
//! store.insert("/about/", CacheEntry::new("<html>about</html>", serde_json::Value::Null));
//!
//! // Keys are canonicalized on both sides
//! assert!(store.get("/about").is_some());
//! ```

mod file;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

pub use file::FileStore;

/// A prerendered snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Rendered HTML document (or template body for template routes).
    pub html: String,
    /// Data the page was rendered with.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl CacheEntry {
    /// Create a new entry.
    pub fn new(html: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            html: html.into(),
            data,
        }
    }
}

/// Strip one trailing slash unless the path is the root.
///
/// ```
/// assert_eq!(snapgate_store::canonicalize("/post/1/"), "/post/1");
/// assert_eq!(snapgate_store::canonicalize("/"), "/");
/// ```
pub fn canonicalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Read access to prerendered snapshots.
///
/// Implementations canonicalize `path` before lookup. Read or decode failures
/// are logged and reported as a miss.
pub trait PageStore: Send + Sync {
    /// Retrieve the snapshot stored for `path`.
    fn get(&self, path: &str) -> Option<CacheEntry>;
}

/// In-memory [`PageStore`].
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `path`.
    pub fn insert(&self, path: &str, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(canonicalize(path).to_owned(), entry);
    }
}

impl PageStore for MemoryStore {
    fn get(&self, path: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(canonicalize(path))
            .cloned()
    }
}

/// Store error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Entry could not be serialized.
    #[error("failed to encode entry: {0}")]
    Encode(#[source] serde_json::Error),
    /// Entry could not be deserialized.
    #[error("failed to decode entry: {0}")]
    Decode(#[source] serde_json::Error),
    /// The directory was written by an incompatible store version.
    #[error("store at {path} has format '{found}', expected '{expected}'")]
    IncompatibleFormat {
        /// Store directory.
        path: String,
        /// Format marker found on disk.
        found: String,
        /// Format marker this build understands.
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("/"), "/");
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("/about"), "/about");
        assert_eq!(canonicalize("/about/"), "/about");
        // Only one slash is stripped
        assert_eq!(canonicalize("/about//"), "/about/");
    }

    #[test]
    fn test_memory_store_canonical_keys() {
        let store = MemoryStore::new();
        store.insert("/post-template/", CacheEntry::new("<p>{{title}}</p>", json!(null)));

        assert_eq!(
            store.get("/post-template").map(|e| e.html),
            Some("<p>{{title}}</p>".to_owned())
        );
        assert_eq!(
            store.get("/post-template/").map(|e| e.html),
            Some("<p>{{title}}</p>".to_owned())
        );
        assert!(store.get("/other").is_none());
    }

    #[test]
    fn test_memory_store_replace() {
        let store = MemoryStore::new();
        store.insert("/", CacheEntry::new("first", json!({"n": 1})));
        store.insert("/", CacheEntry::new("second", json!({"n": 2})));

        let entry = store.get("/").unwrap();
        assert_eq!(entry.html, "second");
        assert_eq!(entry.data["n"], 2);
    }

    #[test]
    fn test_entry_data_defaults_to_null() {
        let entry: CacheEntry = serde_json::from_str(r#"{"html": "<p></p>"}"#).unwrap();
        assert_eq!(entry.data, serde_json::Value::Null);
    }
}
