//! Sitemap protocol XML documents.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::{SitemapError, SitemapItem};

/// Sitemap protocol namespace.
const NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Render a `urlset` with one `<url>` per item.
pub(crate) fn urlset(domain: &str, items: &[SitemapItem]) -> Result<String, SitemapError> {
    let mut doc = Document::new("urlset")?;
    for item in items {
        let loc = format!("{domain}{}", item.url);
        doc.entry("url", &loc, Some(item.last_updated_at.as_str()))?;
    }
    doc.finish()
}

/// Render a `sitemapindex` listing the given document URLs.
pub(crate) fn sitemap_index(locs: &[String]) -> Result<String, SitemapError> {
    let mut doc = Document::new("sitemapindex")?;
    for loc in locs {
        doc.entry("sitemap", loc, None)?;
    }
    doc.finish()
}

/// Incrementally written document.
struct Document {
    writer: Writer<Vec<u8>>,
    root: &'static str,
}

impl Document {
    fn new(root: &'static str) -> Result<Self, SitemapError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;

        let mut start = BytesStart::new(root);
        start.push_attribute(("xmlns", NAMESPACE));
        writer.write_event(Event::Start(start)).map_err(xml_error)?;

        Ok(Self { writer, root })
    }

    /// Write `<tag><loc>..</loc><lastmod>..</lastmod></tag>`.
    fn entry(&mut self, tag: &str, loc: &str, lastmod: Option<&str>) -> Result<(), SitemapError> {
        self.open(tag)?;
        self.text_element("loc", loc)?;
        if let Some(lastmod) = lastmod.filter(|s| !s.is_empty()) {
            self.text_element("lastmod", lastmod)?;
        }
        self.close(tag)
    }

    fn text_element(&mut self, tag: &str, text: &str) -> Result<(), SitemapError> {
        self.open(tag)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.close(tag)
    }

    fn open(&mut self, tag: &str) -> Result<(), SitemapError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(tag)))
            .map_err(xml_error)
    }

    fn close(&mut self, tag: &str) -> Result<(), SitemapError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(xml_error)
    }

    fn finish(mut self) -> Result<String, SitemapError> {
        self.close(self.root)?;
        String::from_utf8(self.writer.into_inner()).map_err(xml_error)
    }
}

fn xml_error(e: impl std::fmt::Display) -> SitemapError {
    SitemapError::Xml(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_urlset_document() {
        let items = vec![
            SitemapItem::new("/post/0", "2024-01-01"),
            SitemapItem::new("/post/1", ""),
        ];
        let xml = urlset("https://example.com", &items).unwrap();

        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
  <url>\n\
    <loc>https://example.com/post/0</loc>\n\
    <lastmod>2024-01-01</lastmod>\n\
  </url>\n\
  <url>\n\
    <loc>https://example.com/post/1</loc>\n\
  </url>\n\
</urlset>"
        );
    }

    #[test]
    fn test_empty_urlset() {
        let xml = urlset("https://example.com", &[]).unwrap();
        assert!(xml.contains("<urlset xmlns="));
        assert!(xml.ends_with("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_loc_is_escaped() {
        let items = vec![SitemapItem::new("/search?a=1&b=<2>", "")];
        let xml = urlset("https://example.com", &items).unwrap();
        assert!(xml.contains("<loc>https://example.com/search?a=1&amp;b=&lt;2&gt;</loc>"));
    }

    #[test]
    fn test_sitemap_index_document() {
        let locs = vec![
            "https://example.com/sitemap/posts-0.xml".to_owned(),
            "https://example.com/sitemap/posts-1.xml".to_owned(),
        ];
        let xml = sitemap_index(&locs).unwrap();

        assert!(xml.contains("<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert_eq!(xml.matches("<sitemap>").count(), 2);
        assert!(xml.contains("<loc>https://example.com/sitemap/posts-1.xml</loc>"));
        assert!(!xml.contains("<lastmod>"));
    }
}
