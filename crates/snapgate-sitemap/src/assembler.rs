//! Sitemap path resolution and document assembly.

use std::sync::Arc;

use crate::xml;
use crate::{
    MAX_URLS_PER_SITEMAP, SITEMAP_PREFIX, SitemapError, SitemapSource, chunk_count,
};

/// Serves sitemap documents for a set of collections.
pub struct SitemapAssembler {
    domain: String,
    chunk_size: u64,
    sources: Vec<Arc<dyn SitemapSource>>,
}

/// Resolved sitemap document.
enum Document<'a> {
    Root,
    Collection(&'a Arc<dyn SitemapSource>),
    Chunk(&'a Arc<dyn SitemapSource>, u64),
}

impl SitemapAssembler {
    /// Create an assembler that prefixes every URL with `domain`.
    ///
    /// A trailing slash on the domain is dropped.
    pub fn new(domain: impl Into<String>, sources: Vec<Arc<dyn SitemapSource>>) -> Self {
        let mut domain = domain.into();
        while domain.ends_with('/') {
            domain.pop();
        }
        Self {
            domain,
            chunk_size: MAX_URLS_PER_SITEMAP,
            sources,
        }
    }

    /// Override the number of URLs per chunk, clamped to `1..=50_000`.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_URLS_PER_SITEMAP);
        self
    }

    /// Render the document at `path` (e.g. `/sitemap/posts-1.xml`).
    pub async fn render(&self, path: &str) -> Result<String, SitemapError> {
        let document = self
            .resolve(path)
            .ok_or_else(|| SitemapError::NotFound(path.to_owned()))?;

        match document {
            Document::Root => self.root_index().await,
            Document::Collection(source) => self.collection(source.as_ref()).await,
            Document::Chunk(source, index) => self.chunk(source.as_ref(), index, path).await,
        }
    }

    fn resolve(&self, path: &str) -> Option<Document<'_>> {
        let rest = path.strip_prefix(SITEMAP_PREFIX)?;
        if rest == ".xml" {
            // A single collection is served at the root without an extra index
            return Some(match self.sources.as_slice() {
                [only] => Document::Collection(only),
                _ => Document::Root,
            });
        }
        let stem = rest.strip_prefix('/')?.strip_suffix(".xml")?;

        // An exact name wins over a chunk reading of the same stem
        if let Some(source) = self.find(stem) {
            return Some(Document::Collection(source));
        }

        let (name, index) = stem.rsplit_once('-')?;
        let index = parse_index(index)?;
        self.find(name).map(|source| Document::Chunk(source, index))
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn SitemapSource>> {
        self.sources.iter().find(|s| s.unique_name() == name)
    }

    /// Index of every collection document, expanded to chunks where needed.
    ///
    /// Used when zero or several collections are registered.
    async fn root_index(&self) -> Result<String, SitemapError> {
        let mut locs = Vec::new();
        for source in &self.sources {
            let name = source.unique_name();
            let total = total_count(source.as_ref()).await?;
            if total > self.chunk_size {
                locs.extend(
                    (0..chunk_count(total, self.chunk_size)).map(|i| self.chunk_loc(name, i)),
                );
            } else {
                locs.push(self.collection_loc(name));
            }
        }
        xml::sitemap_index(&locs)
    }

    /// A single urlset, or an index of chunks when the collection is too large.
    async fn collection(&self, source: &dyn SitemapSource) -> Result<String, SitemapError> {
        let name = source.unique_name();
        let total = total_count(source).await?;

        if total > self.chunk_size {
            let locs: Vec<String> = (0..chunk_count(total, self.chunk_size))
                .map(|i| self.chunk_loc(name, i))
                .collect();
            tracing::debug!(name, total, chunks = locs.len(), "sitemap chunk index");
            return xml::sitemap_index(&locs);
        }

        let items = load(source, total, 0).await?;
        xml::urlset(&self.domain, &items)
    }

    async fn chunk(
        &self,
        source: &dyn SitemapSource,
        index: u64,
        path: &str,
    ) -> Result<String, SitemapError> {
        let total = total_count(source).await?;
        if index >= chunk_count(total, self.chunk_size) {
            return Err(SitemapError::NotFound(path.to_owned()));
        }
        let skip = index * self.chunk_size;
        let items = load(source, self.chunk_size, skip).await?;
        xml::urlset(&self.domain, &items)
    }

    fn collection_loc(&self, name: &str) -> String {
        format!("{}{SITEMAP_PREFIX}/{name}.xml", self.domain)
    }

    fn chunk_loc(&self, name: &str, index: u64) -> String {
        format!("{}{SITEMAP_PREFIX}/{name}-{index}.xml", self.domain)
    }
}

async fn total_count(source: &dyn SitemapSource) -> Result<u64, SitemapError> {
    source
        .total_count()
        .await
        .map_err(|e| SitemapError::Source {
            name: source.unique_name().to_owned(),
            source: e,
        })
}

/// Load a chunk, truncating overlong loader output to `limit`.
async fn load(
    source: &dyn SitemapSource,
    limit: u64,
    items_to_skip: u64,
) -> Result<Vec<crate::SitemapItem>, SitemapError> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let mut items = source
        .load_chunk(limit, items_to_skip)
        .await
        .map_err(|e| SitemapError::Source {
            name: source.unique_name().to_owned(),
            source: e,
        })?;

    let max = usize::try_from(limit).unwrap_or(usize::MAX);
    if items.len() > max {
        tracing::warn!(
            name = source.unique_name(),
            limit,
            returned = items.len(),
            "sitemap source returned more items than requested"
        );
        items.truncate(max);
    }
    Ok(items)
}

/// Decimal chunk index without sign or leading zeros.
fn parse_index(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || (s.len() > 1 && s.starts_with('0'))
    {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{SitemapItem, SourceError};

    /// Synthetic collection that records chunk requests.
    struct Numbered {
        name: &'static str,
        total: u64,
        extra: u64,
        calls: Mutex<Vec<(u64, u64)>>,
    }

    impl Numbered {
        fn new(name: &'static str, total: u64) -> Arc<Self> {
            Arc::new(Self {
                name,
                total,
                extra: 0,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(u64, u64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SitemapSource for Numbered {
        fn unique_name(&self) -> &str {
            self.name
        }

        async fn total_count(&self) -> Result<u64, SourceError> {
            Ok(self.total)
        }

        async fn load_chunk(
            &self,
            limit: u64,
            items_to_skip: u64,
        ) -> Result<Vec<SitemapItem>, SourceError> {
            self.calls.lock().unwrap().push((limit, items_to_skip));
            let end = (items_to_skip + limit).min(self.total) + self.extra;
            Ok((items_to_skip..end)
                .map(|i| SitemapItem::new(format!("/post/{i}"), "2024-01-01"))
                .collect())
        }
    }

    struct Failing;

    #[async_trait]
    impl SitemapSource for Failing {
        fn unique_name(&self) -> &str {
            "broken"
        }

        async fn total_count(&self) -> Result<u64, SourceError> {
            Err(SourceError::new("backend unavailable"))
        }

        async fn load_chunk(&self, _: u64, _: u64) -> Result<Vec<SitemapItem>, SourceError> {
            Err(SourceError::new("backend unavailable"))
        }
    }

    fn assembler(sources: Vec<Arc<dyn SitemapSource>>) -> SitemapAssembler {
        SitemapAssembler::new("https://example.com", sources)
    }

    #[tokio::test]
    async fn test_small_collection_is_single_urlset() {
        let posts = Numbered::new("posts", 10);
        let sitemap = assembler(vec![posts.clone()]);

        let xml = sitemap.render("/sitemap/posts.xml").await.unwrap();

        assert_eq!(xml.matches("<url>").count(), 10);
        assert!(xml.contains("<loc>https://example.com/post/0</loc>"));
        assert!(xml.contains("<loc>https://example.com/post/9</loc>"));
        assert_eq!(posts.calls(), vec![(10, 0)]);
    }

    #[tokio::test]
    async fn test_large_collection_is_chunk_index() {
        let posts = Numbered::new("posts", 100_000);
        let sitemap = assembler(vec![posts.clone()]);

        let index = sitemap.render("/sitemap/posts.xml").await.unwrap();

        assert!(index.contains("<sitemapindex"));
        assert_eq!(index.matches("<sitemap>").count(), 2);
        assert!(index.contains("<loc>https://example.com/sitemap/posts-0.xml</loc>"));
        assert!(index.contains("<loc>https://example.com/sitemap/posts-1.xml</loc>"));
        assert!(posts.calls().is_empty());
    }

    #[tokio::test]
    async fn test_chunks_request_expected_windows() {
        let posts = Numbered::new("posts", 100_000);
        let sitemap = assembler(vec![posts.clone()]);

        let first = sitemap.render("/sitemap/posts-0.xml").await.unwrap();
        let second = sitemap.render("/sitemap/posts-1.xml").await.unwrap();

        assert_eq!(posts.calls(), vec![(50_000, 0), (50_000, 50_000)]);
        assert_eq!(first.matches("<url>").count(), 50_000);
        assert!(second.contains("<loc>https://example.com/post/50000</loc>"));
        assert!(second.contains("<loc>https://example.com/post/99999</loc>"));
    }

    #[tokio::test]
    async fn test_chunk_out_of_range_is_not_found() {
        let posts = Numbered::new("posts", 100_000);
        let sitemap = assembler(vec![posts.clone()]);

        let err = sitemap.render("/sitemap/posts-2.xml").await.unwrap_err();

        assert!(matches!(err, SitemapError::NotFound(_)));
        assert!(posts.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_collection_skips_loader() {
        let posts = Numbered::new("posts", 0);
        let sitemap = assembler(vec![posts.clone()]);

        let xml = sitemap.render("/sitemap/posts.xml").await.unwrap();

        assert!(xml.contains("<urlset"));
        assert!(!xml.contains("<url>"));
        assert!(posts.calls().is_empty());
        assert!(matches!(
            sitemap.render("/sitemap/posts-0.xml").await,
            Err(SitemapError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_overlong_chunk_is_truncated() {
        let posts = Arc::new(Numbered {
            name: "posts",
            total: 5,
            extra: 3,
            calls: Mutex::new(Vec::new()),
        });
        let sitemap = assembler(vec![posts]);

        let xml = sitemap.render("/sitemap/posts.xml").await.unwrap();

        assert_eq!(xml.matches("<url>").count(), 5);
    }

    #[tokio::test]
    async fn test_root_index_lists_collections() {
        let small = Numbered::new("pages", 3);
        let large = Numbered::new("posts", 100_001);
        let sitemap = assembler(vec![small, large]);

        let xml = sitemap.render("/sitemap.xml").await.unwrap();

        let locs: Vec<&str> = xml
            .lines()
            .filter_map(|l| l.trim().strip_prefix("<loc>")?.strip_suffix("</loc>"))
            .collect();
        assert_eq!(
            locs,
            vec![
                "https://example.com/sitemap/pages.xml",
                "https://example.com/sitemap/posts-0.xml",
                "https://example.com/sitemap/posts-1.xml",
                "https://example.com/sitemap/posts-2.xml",
            ]
        );
    }

    #[tokio::test]
    async fn test_root_with_single_small_collection_is_urlset() {
        let posts = Numbered::new("posts", 10);
        let sitemap = assembler(vec![posts.clone()]);

        let xml = sitemap.render("/sitemap.xml").await.unwrap();

        assert!(xml.contains("<urlset"));
        assert!(!xml.contains("<sitemapindex"));
        assert_eq!(xml.matches("<url>").count(), 10);
        assert_eq!(posts.calls(), vec![(10, 0)]);
        assert_eq!(xml, sitemap.render("/sitemap/posts.xml").await.unwrap());
    }

    #[tokio::test]
    async fn test_root_with_single_large_collection_is_chunk_index() {
        let posts = Numbered::new("posts", 100_000);
        let sitemap = assembler(vec![posts.clone()]);

        let xml = sitemap.render("/sitemap.xml").await.unwrap();

        assert!(xml.contains("<sitemapindex"));
        assert_eq!(xml.matches("<sitemap>").count(), 2);
        assert!(xml.contains("<loc>https://example.com/sitemap/posts-1.xml</loc>"));
        assert!(posts.calls().is_empty());
    }

    #[tokio::test]
    async fn test_root_without_collections_is_empty_index() {
        let sitemap = assembler(Vec::new());

        let xml = sitemap.render("/sitemap.xml").await.unwrap();

        assert!(xml.contains("<sitemapindex"));
        assert!(!xml.contains("<sitemap>"));
    }

    #[tokio::test]
    async fn test_exact_name_wins_over_chunk_reading() {
        let base = Numbered::new("posts", 100_000);
        let exact = Numbered::new("posts-1", 2);
        let sitemap = assembler(vec![base.clone(), exact.clone()]);

        let xml = sitemap.render("/sitemap/posts-1.xml").await.unwrap();

        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(base.calls().is_empty());
        assert_eq!(exact.calls(), vec![(2, 0)]);
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_found() {
        let sitemap = assembler(vec![Numbered::new("posts", 10)]);

        for path in [
            "/sitemap",
            "/sitemap/",
            "/sitemap/other.xml",
            "/sitemap/posts",
            "/sitemap/posts-01.xml",
            "/sitemap/posts--1.xml",
            "/sitemap/posts-x.xml",
            "/sitemaps.xml",
        ] {
            assert!(
                matches!(sitemap.render(path).await, Err(SitemapError::NotFound(_))),
                "{path} should be not found"
            );
        }
    }

    #[tokio::test]
    async fn test_source_error_is_reported() {
        let sitemap = assembler(vec![Arc::new(Failing)]);

        let err = sitemap.render("/sitemap/broken.xml").await.unwrap_err();

        assert!(matches!(err, SitemapError::Source { ref name, .. } if name == "broken"));
    }

    #[tokio::test]
    async fn test_output_is_idempotent() {
        let sitemap = assembler(vec![Numbered::new("posts", 120)]).with_chunk_size(50);

        let first = sitemap.render("/sitemap/posts-2.xml").await.unwrap();
        let second = sitemap.render("/sitemap/posts-2.xml").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.matches("<url>").count(), 20);
    }

    #[test]
    fn test_domain_trailing_slash_dropped() {
        let sitemap = SitemapAssembler::new("https://example.com/", Vec::new());
        assert_eq!(
            sitemap.collection_loc("posts"),
            "https://example.com/sitemap/posts.xml"
        );
    }

    #[test]
    fn test_chunk_size_clamped() {
        let sitemap = SitemapAssembler::new("https://e.com", Vec::new());
        assert_eq!(sitemap.chunk_size, 50_000);
        assert_eq!(sitemap.with_chunk_size(0).chunk_size, 1);
        let sitemap = SitemapAssembler::new("https://e.com", Vec::new());
        assert_eq!(sitemap.with_chunk_size(80_000).chunk_size, 50_000);
    }
}
