//! Configured page loaders and sitemap sources for snapgate.
//!
//! Turns the `[[dynamic_routes]]` declarations of a [`Config`] into a
//! [`RouteTable`] whose loaders and sitemap sources are:
//!
//! - [`HttpJsonLoader`]: `GET` a URL template filled from route parameters
//! - [`StaticDataLoader`]: Fixed JSON from the configuration
//! - [`SequenceSource`]: URLs generated from an `{index}` template
//! - [`HttpSitemapSource`]: Chunks fetched from a paginated JSON endpoint

mod http;
mod sequence;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use snapgate_config::{Config, ConfigError, LoaderConfig, SitemapSourceConfig, SitemapSourceKind};
use snapgate_routes::{
    DynamicRoute, LoadError, LoaderContext, PageLoader, Route, RouteError, RouteTable,
};
use snapgate_sitemap::SitemapSource;

pub use http::{HttpJsonLoader, HttpSitemapSource};
pub use sequence::SequenceSource;

/// Error building routes from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SourcesError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Invalid route declaration.
    #[error(transparent)]
    Route(#[from] RouteError),
    /// HTTP client could not be created.
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Loader returning the same JSON for every request.
#[derive(Debug, Clone)]
pub struct StaticDataLoader {
    data: Value,
}

impl StaticDataLoader {
    /// Create a loader returning `data`.
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

#[async_trait]
impl PageLoader for StaticDataLoader {
    async fn load(&self, _ctx: &LoaderContext) -> Result<Value, LoadError> {
        Ok(self.data.clone())
    }
}

/// Build the route table declared by `config`.
///
/// All HTTP loaders and sources share one client.
pub fn route_table(config: &Config) -> Result<RouteTable, SourcesError> {
    let client = reqwest::Client::builder().build()?;
    let mut routes = Vec::with_capacity(config.static_routes.len() + config.dynamic_routes.len());

    for path in &config.static_routes {
        routes.push(Route::static_page(path)?);
    }

    for declared in &config.dynamic_routes {
        let loader: Arc<dyn PageLoader> = match &declared.loader {
            LoaderConfig::Http { url } => Arc::new(HttpJsonLoader::new(client.clone(), url)),
            LoaderConfig::Static { data } => Arc::new(StaticDataLoader::new(data.clone())),
        };

        let mut route = DynamicRoute::new(&declared.path, &declared.template_route, loader)?;
        if let Some(sitemap) = &declared.sitemap {
            route = route.with_sitemap(sitemap_source(sitemap, &client)?);
        }
        tracing::debug!(
            pattern = route.pattern.as_str(),
            template = %route.template_route,
            sitemap = route.sitemap.is_some(),
            "registered dynamic route"
        );
        routes.push(Route::Dynamic(route));
    }

    Ok(RouteTable::new(routes)?)
}

fn sitemap_source(
    config: &SitemapSourceConfig,
    client: &reqwest::Client,
) -> Result<Arc<dyn SitemapSource>, ConfigError> {
    let source: Arc<dyn SitemapSource> = match config.kind()? {
        SitemapSourceKind::Sequence { url_template } => Arc::new(SequenceSource::new(
            &config.unique_name,
            config.total,
            url_template,
            config.last_updated_at.as_deref().unwrap_or_default(),
        )),
        SitemapSourceKind::Http { url } => Arc::new(HttpSitemapSource::new(
            client.clone(),
            &config.unique_name,
            config.total,
            url,
        )),
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use snapgate_routes::{Classification, RequestTarget};

    use super::*;

    fn config(toml: &str) -> Config {
        Config::from_toml_str(toml, Path::new("/srv")).unwrap()
    }

    #[tokio::test]
    async fn test_route_table_from_config() {
        let config = config(
            r#"
static_routes = ["/", "/about"]

[[dynamic_routes]]
path = "/post/:id"
template_route = "/post-template"
loader = { kind = "static", data = { title = "Post" } }
sitemap = { unique_name = "posts", total = 3, url_template = "/post/{index}" }

[[dynamic_routes]]
path = "/user/:name"
template_route = "/user-template"
loader = { kind = "http", url = "http://api.local/users/{name}" }
"#,
        );
        let table = route_table(&config).unwrap();

        assert!(matches!(
            table.classify(&RequestTarget::parse("/about")),
            Classification::Static
        ));
        assert!(matches!(
            table.classify(&RequestTarget::parse("/post-template")),
            Classification::TemplateOnly
        ));

        let Classification::Dynamic { route, .. } =
            table.classify(&RequestTarget::parse("/post/1"))
        else {
            panic!("expected dynamic");
        };
        let data = route.loader.load(&LoaderContext::default()).await.unwrap();
        assert_eq!(data, json!({"title": "Post"}));

        let sources = table.sitemap_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].unique_name(), "posts");
        assert_eq!(sources[0].total_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_static_loader_ignores_request() {
        let loader = StaticDataLoader::new(json!([1, 2]));
        let ctx = LoaderContext {
            path: "/x".to_owned(),
            ..LoaderContext::default()
        };
        assert_eq!(loader.load(&ctx).await.unwrap(), json!([1, 2]));
    }
}
