//! File-based store implementation.
//!
//! [`FileStore`] keeps one file per snapshot. File names are the hex SHA-256
//! of the canonical path, fanned out by the first two hex characters. Each
//! file holds a zstd-compressed JSON record:
//!
//! ```text
//! {"path": "/about", "html": "<html>...", "data": {...}}
//! ```
//!
//! The stored path is compared on read, so a lookup never returns another
//! key's snapshot.
//!
//! Writes go to a temporary file in the target directory which is then
//! renamed over the entry. Readers see either the previous snapshot or the
//! new one, never a partial file.
//!
//! Directory layout:
//! ```text
//! {root}/
//! +-- FORMAT              # store format marker
//! +-- entries/
//!     +-- 3f/
//!         +-- 3f9a...e1   # one snapshot
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CacheEntry, PageStore, StoreError, canonicalize};

/// Format marker written to `{root}/FORMAT`.
const FORMAT: &str = "snapgate-store/1";

/// Compression level for snapshot files.
const ZSTD_LEVEL: i32 = 3;

/// On-disk record.
#[derive(Serialize, Deserialize)]
struct Record {
    path: String,
    html: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Durable [`PageStore`] rooted at a directory on disk.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open the store at `root`, creating it if it does not exist.
    ///
    /// Existing data is never removed. A directory written by another store
    /// format is rejected.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let format_file = root.join("FORMAT");

        match fs::read_to_string(&format_file) {
            Ok(found) if found.trim() == FORMAT => {
                tracing::debug!(root = %root.display(), "opened page store");
            }
            Ok(found) => {
                return Err(StoreError::IncompatibleFormat {
                    path: root.display().to_string(),
                    found: found.trim().to_owned(),
                    expected: FORMAT,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(root = %root.display(), "initializing page store");
                fs::create_dir_all(root.join("entries"))?;
                fs::write(&format_file, FORMAT)?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self { root })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the snapshot for `path`, replacing any previous one atomically.
    ///
    /// Used by the prerender phase; the gateway never writes.
    pub fn put(&self, path: &str, entry: &CacheEntry) -> Result<(), StoreError> {
        let key = canonicalize(path);
        let record = Record {
            path: key.to_owned(),
            html: entry.html.clone(),
            data: entry.data.clone(),
        };
        let json = serde_json::to_vec(&record).map_err(StoreError::Encode)?;
        let compressed = zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?;

        let target = self.entry_path(key);
        let dir = target
            .parent()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&compressed)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(path = %key, bytes = compressed.len(), "stored snapshot");
        Ok(())
    }

    /// List all readable stored paths, sorted.
    ///
    /// Undecodable entries are logged and skipped.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let entries = self.root.join("entries");
        for shard in fs::read_dir(&entries)? {
            let shard = shard?.path();
            if !shard.is_dir() {
                continue;
            }
            for file in fs::read_dir(&shard)? {
                let file = file?.path();
                // Skip in-flight temp files (".tmpXXXX")
                if file
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with('.'))
                {
                    continue;
                }
                match read_record(&file) {
                    Ok(record) => keys.push(record.path),
                    Err(e) => {
                        tracing::warn!(file = %file.display(), error = %e, "skipping unreadable snapshot");
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Read the snapshot for a canonical key.
    fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let file = self.entry_path(key);
        if !file.exists() {
            return Ok(None);
        }
        let record = read_record(&file)?;
        if record.path != key {
            tracing::warn!(path = %key, stored = %record.path, "snapshot key mismatch");
            return Ok(None);
        }
        Ok(Some(CacheEntry {
            html: record.html,
            data: record.data,
        }))
    }

    /// File holding the snapshot for a canonical key.
    fn entry_path(&self, key: &str) -> PathBuf {
        let name = hex::encode(Sha256::digest(key.as_bytes()));
        self.root.join("entries").join(&name[..2]).join(name)
    }
}

impl PageStore for FileStore {
    fn get(&self, path: &str) -> Option<CacheEntry> {
        let key = canonicalize(path);
        match self.read(key) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %key, error = %e, "failed to read snapshot");
                None
            }
        }
    }
}

/// Decode one snapshot file.
fn read_record(file: &Path) -> Result<Record, StoreError> {
    let compressed = fs::read(file)?;
    let json = zstd::decode_all(compressed.as_slice())?;
    serde_json::from_slice(&json).map_err(StoreError::Decode)
}
