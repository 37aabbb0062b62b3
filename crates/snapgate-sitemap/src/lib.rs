//! Paginated sitemap generation for snapgate.
//!
//! Large collections of dynamic pages are exposed as sitemap-protocol XML
//! split into chunks of at most [`MAX_URLS_PER_SITEMAP`] URLs:
//!
//! - [`SitemapSource`]: Enumerates a collection (`total_count`, `load_chunk`)
//! - [`SitemapAssembler`]: Resolves sitemap paths and renders documents
//!
//! # Document paths
//!
//! ```text
//! /sitemap.xml              index of every collection document
//! /sitemap/{name}.xml       urlset, or an index of chunks when too large
//! /sitemap/{name}-{i}.xml   chunk i (0-based)
//! ```

mod assembler;
mod xml;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use assembler::SitemapAssembler;

/// Reserved path prefix for sitemap documents.
pub const SITEMAP_PREFIX: &str = "/sitemap";

/// Protocol ceiling on URLs per sitemap file.
pub const MAX_URLS_PER_SITEMAP: u64 = 50_000;

/// One URL in a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapItem {
    /// Site-relative URL, appended verbatim to the domain.
    pub url: String,
    /// `lastmod` value; omitted from the document when empty.
    #[serde(default)]
    pub last_updated_at: String,
}

impl SitemapItem {
    /// Create an item.
    pub fn new(url: impl Into<String>, last_updated_at: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_updated_at: last_updated_at.into(),
        }
    }
}

/// Error raised by a [`SitemapSource`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// An enumerable collection of pages.
///
/// `total_count` is authoritative for the number of chunks. `load_chunk`
/// must not change that count and must return the same items for the same
/// arguments while the backing data is unchanged.
#[async_trait]
pub trait SitemapSource: Send + Sync {
    /// Name used in document paths.
    fn unique_name(&self) -> &str;

    /// Number of items in the collection.
    async fn total_count(&self) -> Result<u64, SourceError>;

    /// Load up to `limit` items after skipping `items_to_skip`.
    async fn load_chunk(&self, limit: u64, items_to_skip: u64)
    -> Result<Vec<SitemapItem>, SourceError>;
}

/// Sitemap generation error.
#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    /// No document exists at the requested path.
    #[error("sitemap document not found: {0}")]
    NotFound(String),
    /// A source failed to enumerate its collection.
    #[error("sitemap source '{name}' failed: {source}")]
    Source {
        /// Source unique name.
        name: String,
        /// Underlying error.
        #[source]
        source: SourceError,
    },
    /// XML serialization failed.
    #[error("failed to write sitemap XML: {0}")]
    Xml(String),
}

/// Number of chunks needed for `total` items.
///
/// ```
/// use snapgate_sitemap::chunk_count;
/// assert_eq!(chunk_count(100_000, 50_000), 2);
/// assert_eq!(chunk_count(100_001, 50_000), 3);
/// assert_eq!(chunk_count(0, 50_000), 0);
/// ```
pub fn chunk_count(total: u64, chunk_size: u64) -> u64 {
    total.div_ceil(chunk_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0, 50_000), 0);
        assert_eq!(chunk_count(1, 50_000), 1);
        assert_eq!(chunk_count(10, 50_000), 1);
        assert_eq!(chunk_count(50_000, 50_000), 1);
        assert_eq!(chunk_count(50_001, 50_000), 2);
        assert_eq!(chunk_count(100_000, 50_000), 2);
        assert_eq!(chunk_count(7, 3), 3);
    }

    #[test]
    fn test_item_serde_uses_camel_case() {
        let item: SitemapItem =
            serde_json::from_str(r#"{"url": "/post/1", "lastUpdatedAt": "2024-01-01"}"#).unwrap();
        assert_eq!(item, SitemapItem::new("/post/1", "2024-01-01"));
    }

    #[test]
    fn test_item_lastmod_optional() {
        let item: SitemapItem = serde_json::from_str(r#"{"url": "/a"}"#).unwrap();
        assert_eq!(item.last_updated_at, "");
    }
}
