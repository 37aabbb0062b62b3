//! HTTP gateway for snapgate.
//!
//! Every request goes through a single fallback handler that classifies the
//! target and picks one of:
//!
//! - **Static**: serve the prerendered snapshot with its hydration payload
//! - **Dynamic**: load data, render the cached template, inject hydration
//! - **Sitemap**: paginated sitemap XML
//! - **Fallback**: files from the build folder, else the `index.html` shell
//!
//! Template routes answer 404. Static and dynamic pages are subject to the
//! rendering policy: with `BOT_ONLY`, human clients get the fallback.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use snapgate_server::{Gateway, ServerConfig, run_server};
//! use snapgate_store::FileStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = snapgate_config::Config::load(None, None).unwrap();
//!     let routes = snapgate_sources::route_table(&config).unwrap();
//!     let store = Arc::new(FileStore::open(&config.paths.store_dir).unwrap());
//!
//!     let server_config = ServerConfig::from_config(&config);
//!     run_server(server_config, Gateway::new(routes, store)).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Client ──HTTP──► axum fallback handler
//!                        │
//!                        ├─► RouteTable::classify
//!                        │
//!                        ├─► template route ──► 404
//!                        ├─► sitemap ──► SitemapAssembler
//!                        ├─► static ──► policy ──► PageStore
//!                        ├─► dynamic ──► policy ──► PageLoader + template + hydration
//!                        │
//!                        └─► Fallback (ServeDir + index.html shell)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;
mod static_files;
mod strategy;

use std::path::PathBuf;
use std::sync::Arc;

use snapgate_config::{RenderStrategy, SITEMAP_PROTOCOL_LIMIT, ScriptPlacement};
use snapgate_render::{HandlebarsEngine, InjectionPoint, TemplateEngine};
use snapgate_routes::RouteTable;
use snapgate_store::PageStore;
use state::AppState;

pub use error::ServerError;
pub use strategy::{ClientClass, RenderingPolicy, RouteCategory, classify_client};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Port reserved for the prerender phase; must differ from `port`.
    pub prerendering_port: u16,
    /// Compiled frontend assets, including the `index.html` shell.
    pub build_folder: PathBuf,
    /// Absolute site URL used in sitemap documents.
    pub domain: String,
    /// Which clients get static snapshots and dynamic renders.
    pub policy: RenderingPolicy,
    /// Hydration script placement.
    pub injection: InjectionPoint,
    /// URLs per sitemap chunk.
    pub max_urls_per_file: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            prerendering_port: 4050,
            build_folder: PathBuf::from("dist"),
            domain: "http://localhost:8080".to_owned(),
            policy: RenderingPolicy::default(),
            injection: InjectionPoint::default(),
            max_urls_per_file: SITEMAP_PROTOCOL_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Create server configuration from a loaded snapgate config.
    #[must_use]
    pub fn from_config(config: &snapgate_config::Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            prerendering_port: config.server.prerendering_port,
            build_folder: config.paths.build_folder.clone(),
            domain: config.domain.clone(),
            policy: RenderingPolicy {
                static_strategy: config.rendering.static_strategy,
                dynamic_strategy: config.rendering.dynamic_strategy,
            },
            injection: match config.rendering.inject {
                ScriptPlacement::Head => InjectionPoint::HeadStart,
                ScriptPlacement::Body => InjectionPoint::BodyEnd,
            },
            max_urls_per_file: config.sitemap.max_urls_per_file,
        }
    }

    /// Whether either route category is restricted to automated clients.
    pub fn bot_only(&self) -> bool {
        self.policy.static_strategy == RenderStrategy::BotOnly
            || self.policy.dynamic_strategy == RenderStrategy::BotOnly
    }
}

/// Request-independent collaborators of the gateway.
///
/// Constructed once at startup and shared read-only by all requests.
pub struct Gateway {
    routes: Arc<RouteTable>,
    store: Arc<dyn PageStore>,
    engine: Arc<dyn TemplateEngine>,
}

impl Gateway {
    /// Create a gateway using the built-in [`HandlebarsEngine`].
    pub fn new(routes: RouteTable, store: Arc<dyn PageStore>) -> Self {
        Self {
            routes: Arc::new(routes),
            store,
            engine: Arc::new(HandlebarsEngine::new()),
        }
    }

    /// Replace the template engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.engine = engine;
        self
    }
}

/// Run the gateway until Ctrl-C.
///
/// # Errors
///
/// Returns [`ServerError::PortConflict`] if the serving port equals the
/// prerendering port, or an I/O error if binding or serving fails.
pub async fn run_server(config: ServerConfig, gateway: Gateway) -> Result<(), ServerError> {
    if config.port == config.prerendering_port {
        return Err(ServerError::PortConflict(config.port));
    }

    let state = Arc::new(AppState::new(&config, gateway));
    let app = app::create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        build_folder = %config.build_folder.display(),
        "Starting server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
