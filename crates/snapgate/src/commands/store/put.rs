//! `snapgate store put` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::Value;
use snapgate_store::{CacheEntry, canonicalize};

use super::StoreLocation;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the put command.
#[derive(Args)]
pub(crate) struct PutArgs {
    #[command(flatten)]
    location: StoreLocation,

    /// Request path the snapshot answers (e.g. /about).
    #[arg(long)]
    path: String,

    /// HTML file to store.
    #[arg(long)]
    html: PathBuf,

    /// JSON file with the page data (default: null).
    #[arg(long)]
    data: Option<PathBuf>,
}

impl PutArgs {
    /// Execute the put command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let entry = read_entry(&self.path, &self.html, self.data.as_deref())?;

        let store = self.location.open()?;
        store.put(&self.path, &entry)?;

        output.success(&format!(
            "Stored {} ({} bytes of HTML)",
            canonicalize(&self.path),
            entry.html.len()
        ));
        Ok(())
    }
}

/// Build a snapshot from files on disk.
fn read_entry(path: &str, html: &Path, data: Option<&Path>) -> Result<CacheEntry, CliError> {
    if !path.starts_with('/') {
        return Err(CliError::Validation(format!(
            "Snapshot path must start with '/': {path}"
        )));
    }

    let html = std::fs::read_to_string(html)?;
    let data = match data {
        Some(file) => serde_json::from_str(&std::fs::read_to_string(file)?)?,
        None => Value::Null,
    };
    Ok(CacheEntry::new(html, data))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_read_entry_with_data() {
        let tmp = TempDir::new().unwrap();
        let html = tmp.path().join("page.html");
        let data = tmp.path().join("page.json");
        fs::write(&html, "<html></html>").unwrap();
        fs::write(&data, r#"{"title": "About"}"#).unwrap();

        let entry = read_entry("/about", &html, Some(&data)).unwrap();

        assert_eq!(entry, CacheEntry::new("<html></html>", json!({"title": "About"})));
    }

    #[test]
    fn test_read_entry_defaults_to_null_data() {
        let tmp = TempDir::new().unwrap();
        let html = tmp.path().join("page.html");
        fs::write(&html, "x").unwrap();

        let entry = read_entry("/", &html, None).unwrap();

        assert_eq!(entry.data, Value::Null);
    }

    #[test]
    fn test_read_entry_rejects_relative_path() {
        let err = read_entry("about", Path::new("unused.html"), None).unwrap_err();
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[test]
    fn test_read_entry_invalid_json() {
        let tmp = TempDir::new().unwrap();
        let html = tmp.path().join("page.html");
        let data = tmp.path().join("page.json");
        fs::write(&html, "x").unwrap();
        fs::write(&data, "{not json").unwrap();

        let err = read_entry("/", &html, Some(&data)).unwrap_err();
        assert!(matches!(err, CliError::Json(_)));
    }
}
