//! HTTP-backed page loader and sitemap source.

use std::collections::BTreeMap;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use snapgate_routes::{LoadError, LoaderContext, PageLoader};
use snapgate_sitemap::{SitemapItem, SitemapSource, SourceError};

/// Characters left unescaped in a substituted path segment (RFC 3986 unreserved).
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Loads page data as JSON from an HTTP endpoint.
///
/// `{name}` placeholders in the URL template are replaced by the
/// percent-encoded route parameter of the same name. Request query parameters
/// are forwarded. Non-2xx responses and non-JSON bodies are load errors.
#[derive(Debug, Clone)]
pub struct HttpJsonLoader {
    client: reqwest::Client,
    url_template: String,
}

impl HttpJsonLoader {
    /// Create a loader for `url_template`.
    pub fn new(client: reqwest::Client, url_template: &str) -> Self {
        Self {
            client,
            url_template: url_template.to_owned(),
        }
    }

    /// URL for the given route parameters.
    pub fn url_for(&self, params: &BTreeMap<String, String>) -> String {
        fill_template(&self.url_template, params)
    }
}

#[async_trait]
impl PageLoader for HttpJsonLoader {
    async fn load(&self, ctx: &LoaderContext) -> Result<Value, LoadError> {
        let url = self.url_for(&ctx.params);
        tracing::debug!(path = %ctx.path, %url, "loading page data");

        let response = self
            .client
            .get(&url)
            .query(&ctx.query)
            .send()
            .await
            .map_err(|e| LoadError::with_source(format!("request to {url} failed"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::new(format!("{url} returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| LoadError::with_source(format!("invalid JSON from {url}"), e))
    }
}

/// Sitemap collection fetched from a paginated JSON endpoint.
///
/// Chunks are requested as `GET {url}?limit={limit}&skip={skip}` and must be
/// a JSON array of `{"url": .., "lastUpdatedAt": ..}` objects. The total
/// count comes from configuration.
#[derive(Debug, Clone)]
pub struct HttpSitemapSource {
    client: reqwest::Client,
    name: String,
    total: u64,
    url: String,
}

impl HttpSitemapSource {
    /// Create a source.
    pub fn new(client: reqwest::Client, name: &str, total: u64, url: &str) -> Self {
        Self {
            client,
            name: name.to_owned(),
            total,
            url: url.to_owned(),
        }
    }
}

#[async_trait]
impl SitemapSource for HttpSitemapSource {
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
        let response = self
            .client
            .get(&self.url)
            .query(&[("limit", limit), ("skip", items_to_skip)])
            .send()
            .await
            .map_err(|e| SourceError::with_source(format!("request to {} failed", self.url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::new(format!("{} returned {status}", self.url)));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::with_source(format!("invalid chunk from {}", self.url), e))
    }
}

/// Replace `{name}` placeholders with encoded parameter values.
///
/// Placeholders without a matching parameter are kept verbatim.
fn fill_template(template: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match params.get(name) {
                    Some(value) => out.extend(utf8_percent_encode(value, SEGMENT_ENCODE_SET)),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
