//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use snapgate_render::{InjectionPoint, TemplateEngine};
use snapgate_routes::RouteTable;
use snapgate_sitemap::SitemapAssembler;
use snapgate_store::PageStore;

use crate::static_files::Fallback;
use crate::strategy::RenderingPolicy;
use crate::{Gateway, ServerConfig};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Route classifier.
    pub(crate) routes: Arc<RouteTable>,
    /// Prerendered snapshots.
    pub(crate) store: Arc<dyn PageStore>,
    /// Template engine for dynamic routes.
    pub(crate) engine: Arc<dyn TemplateEngine>,
    /// Sitemap documents for the routes' collections.
    pub(crate) sitemap: SitemapAssembler,
    /// Rendering strategies.
    pub(crate) policy: RenderingPolicy,
    /// Hydration script placement.
    pub(crate) injection: InjectionPoint,
    /// Static files and the application shell.
    pub(crate) fallback: Fallback,
}

impl AppState {
    pub(crate) fn new(config: &ServerConfig, gateway: Gateway) -> Self {
        let sitemap = SitemapAssembler::new(&config.domain, gateway.routes.sitemap_sources())
            .with_chunk_size(config.max_urls_per_file);

        Self {
            routes: gateway.routes,
            store: gateway.store,
            engine: gateway.engine,
            sitemap,
            policy: config.policy,
            injection: config.injection,
            fallback: Fallback::new(config.build_folder.clone()),
        }
    }
}
