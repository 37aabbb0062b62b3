//! `snapgate serve` command implementation.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use snapgate_config::{CliSettings, Config};
use snapgate_server::{Gateway, ServerConfig, run_server};
use snapgate_store::{FileStore, PageStore, canonicalize};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover snapgate.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long, env = "SNAPGATE_PORT")]
    port: Option<u16>,

    /// Compiled frontend directory holding index.html (overrides config).
    #[arg(short, long)]
    build_folder: Option<PathBuf>,

    /// Snapshot store directory (overrides config).
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Enable verbose output (request and loader logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            build_folder: self.build_folder,
            store_dir: self.store_dir,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::info!(config_path = ?config.config_path, "Configuration loaded");

        let routes = snapgate_sources::route_table(&config)?;
        let store = FileStore::open(&config.paths.store_dir)?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Build folder: {}",
            config.paths.build_folder.display()
        ));
        output.info(&format!("Store: {}", store.root().display()));
        output.info(&format!(
            "Routes: {} static, {} dynamic",
            config.static_routes.len(),
            config.dynamic_routes.len()
        ));

        for missing in missing_snapshots(&config, &store) {
            output.warning(&format!("No snapshot in store for {missing}"));
        }

        let server_config = ServerConfig::from_config(&config);
        if server_config.bot_only() {
            output.info("Rendering: BOT_ONLY enabled, human clients get the application shell");
        }

        run_server(server_config, Gateway::new(routes, Arc::new(store))).await?;

        Ok(())
    }
}

/// Static routes and template routes with no readable snapshot.
///
/// Unreadable entries count as missing; the store logs them.
fn missing_snapshots(config: &Config, store: &dyn PageStore) -> Vec<String> {
    let mut seen = BTreeSet::new();
    config
        .static_routes
        .iter()
        .chain(config.dynamic_routes.iter().map(|r| &r.template_route))
        .map(|path| canonicalize(path).to_owned())
        .filter(|path| seen.insert(path.clone()) && store.get(path).is_none())
        .collect()
}
