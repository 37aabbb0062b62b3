//! Generated sitemap collections.

use async_trait::async_trait;
use snapgate_sitemap::{SitemapItem, SitemapSource, SourceError};

/// Collection of `total` URLs generated from a template.
///
/// `{index}` in the template is replaced by the absolute 0-based item index.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    name: String,
    total: u64,
    url_template: String,
    last_updated_at: String,
}

impl SequenceSource {
    /// Create a source.
    pub fn new(name: &str, total: u64, url_template: &str, last_updated_at: &str) -> Self {
        Self {
            name: name.to_owned(),
            total,
            url_template: url_template.to_owned(),
            last_updated_at: last_updated_at.to_owned(),
        }
    }
}

#[async_trait]
impl SitemapSource for SequenceSource {
    fn unique_name(&self) -> &str {
        &self.name
    }

    async fn total_count(&self) -> Result<u64, SourceError> {
        Ok(self.total)
    }

    async fn load_chunk(
        &self,
        limit: u64,
        items_to_skip: u64,
    ) -> Result<Vec<SitemapItem>, SourceError> {
        let end = items_to_skip.saturating_add(limit).min(self.total);
        Ok((items_to_skip..end)
            .map(|i| {
                SitemapItem::new(
                    self.url_template.replace("{index}", &i.to_string()),
                    self.last_updated_at.clone(),
                )
            })
            .collect())
    }
}
