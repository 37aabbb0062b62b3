//! Route declarations and the classifier.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use snapgate_sitemap::SitemapSource;
use snapgate_store::canonicalize;

use crate::{PageLoader, RequestTarget, RouteError, RoutePattern, is_sitemap_path};

/// Page served from its prerendered snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticRoute {
    /// Canonical path.
    pub path: String,
}

/// Page synthesized from a template snapshot and loaded data.
#[derive(Clone)]
pub struct DynamicRoute {
    /// Path pattern.
    pub pattern: RoutePattern,
    /// Canonical path of the template snapshot. Never served directly.
    pub template_route: String,
    /// Data loader.
    pub loader: Arc<dyn PageLoader>,
    /// Collection enumerating this route's pages for the sitemap.
    pub sitemap: Option<Arc<dyn SitemapSource>>,
}

impl DynamicRoute {
    /// Create a dynamic route without a sitemap.
    pub fn new(
        pattern: &str,
        template_route: &str,
        loader: Arc<dyn PageLoader>,
    ) -> Result<Self, RouteError> {
        if !template_route.starts_with('/') {
            return Err(RouteError::RelativePath(template_route.to_owned()));
        }
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            template_route: canonicalize(template_route).to_owned(),
            loader,
            sitemap: None,
        })
    }

    /// Attach a sitemap collection.
    #[must_use]
    pub fn with_sitemap(mut self, source: Arc<dyn SitemapSource>) -> Self {
        self.sitemap = Some(source);
        self
    }
}

impl fmt::Debug for DynamicRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRoute")
            .field("pattern", &self.pattern.as_str())
            .field("template_route", &self.template_route)
            .field(
                "sitemap",
                &self.sitemap.as_ref().map(|s| s.unique_name().to_owned()),
            )
            .finish_non_exhaustive()
    }
}

/// A declared route.
#[derive(Clone, Debug)]
pub enum Route {
    /// Prerendered page.
    Static(StaticRoute),
    /// Template plus loader.
    Dynamic(DynamicRoute),
}

impl Route {
    /// Declare a static route.
    pub fn static_page(path: &str) -> Result<Self, RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::RelativePath(path.to_owned()));
        }
        Ok(Self::Static(StaticRoute {
            path: canonicalize(path).to_owned(),
        }))
    }
}

/// Result of classifying a request target.
#[derive(Debug)]
pub enum Classification<'a> {
    /// Path is a template route key and must not be served.
    TemplateOnly,
    /// Path is under the sitemap prefix.
    Sitemap,
    /// Path is a declared static route.
    Static,
    /// Path matched a dynamic pattern.
    Dynamic {
        /// Matched route.
        route: &'a DynamicRoute,
        /// Bound parameters.
        params: BTreeMap<String, String>,
    },
    /// No route applies.
    Unmatched,
}

/// Immutable, ordered route configuration.
#[derive(Debug, Default)]
pub struct RouteTable {
    templates: HashSet<String>,
    statics: HashSet<String>,
    dynamics: Vec<DynamicRoute>,
}

impl RouteTable {
    /// Build a table. Dynamic routes keep declaration order.
    ///
    /// Sitemap collection names must be unique.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteError> {
        let mut table = Self::default();
        let mut sitemap_names = HashSet::new();
        for route in routes {
            match route {
                Route::Static(route) => {
                    table.statics.insert(route.path);
                }
                Route::Dynamic(route) => {
                    if let Some(source) = &route.sitemap
                        && !sitemap_names.insert(source.unique_name().to_owned())
                    {
                        return Err(RouteError::DuplicateSitemap(
                            source.unique_name().to_owned(),
                        ));
                    }
                    table.templates.insert(route.template_route.clone());
                    table.dynamics.push(route);
                }
            }
        }
        Ok(table)
    }

    /// Classify a parsed request target.
    pub fn classify(&self, target: &RequestTarget) -> Classification<'_> {
        let path = target.path.as_str();

        if self.templates.contains(path) {
            return Classification::TemplateOnly;
        }
        if is_sitemap_path(path) {
            return Classification::Sitemap;
        }
        if self.statics.contains(path) {
            return Classification::Static;
        }
        self.dynamics
            .iter()
            .find_map(|route| {
                route
                    .pattern
                    .matches(path)
                    .map(|params| Classification::Dynamic { route, params })
            })
            .unwrap_or(Classification::Unmatched)
    }

    /// Sitemap collections of all dynamic routes, in declaration order.
    pub fn sitemap_sources(&self) -> Vec<Arc<dyn SitemapSource>> {
        self.dynamics
            .iter()
            .filter_map(|route| route.sitemap.clone())
            .collect()
    }
}
