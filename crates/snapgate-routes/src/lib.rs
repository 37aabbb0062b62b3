//! Route classification for snapgate.
//!
//! Every inbound request target is classified into exactly one
//! [`Classification`]. Checks run in a fixed order and the first match wins:
//!
//! 1. Template route keys ([`Classification::TemplateOnly`])
//! 2. The reserved sitemap prefix ([`Classification::Sitemap`])
//! 3. Static routes ([`Classification::Static`])
//! 4. Dynamic patterns in declaration order ([`Classification::Dynamic`])
//! 5. Anything else ([`Classification::Unmatched`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use snapgate_routes::{
//!     Classification, DynamicRoute, LoadError, LoaderContext, PageLoader, RequestTarget, Route,
//!     RouteTable,
//! };
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl PageLoader for Echo {
//!     async fn load(&self, ctx: &LoaderContext) -> Result<serde_json::Value, LoadError> {
//!         Ok(serde_json::json!(ctx.params))
//!     }
//! }
//!
//! let table = RouteTable::new(vec![
//!     Route::static_page("/about").unwrap(),
//!     Route::Dynamic(DynamicRoute::new("/post/:id", "/post-template", Arc::new(Echo)).unwrap()),
//! ])
//! .unwrap();
//!
//! let target = RequestTarget::parse("/post/42/?ref=home");
//! match table.classify(&target) {
//!     Classification::Dynamic { params, .. } => assert_eq!(params["id"], "42"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod loader;
mod pattern;
mod table;
mod target;

pub use loader::{LoadError, LoaderContext, PageLoader};
pub use pattern::RoutePattern;
pub use snapgate_sitemap::SITEMAP_PREFIX;
pub use table::{Classification, DynamicRoute, Route, RouteTable, StaticRoute};
pub use target::RequestTarget;

/// Route declaration error.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Route pattern is malformed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Route path is not absolute.
    #[error("route path must start with '/': {0}")]
    RelativePath(String),
    /// Two routes declare sitemap collections with the same name.
    #[error("duplicate sitemap collection name: {0}")]
    DuplicateSitemap(String),
}

/// Whether `path` falls under the reserved sitemap prefix.
///
/// The prefix must be followed by the end of the path, `/` or `.`, so
/// `/sitemap.xml` and `/sitemap/posts.xml` match but `/sitemaps` does not.
pub fn is_sitemap_path(path: &str) -> bool {
    path.strip_prefix(SITEMAP_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '.']))
}
