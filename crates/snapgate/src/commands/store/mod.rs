//! `snapgate store` subcommand group.

mod get;
mod list;
mod put;

use std::path::PathBuf;

use clap::{Args, Subcommand};
use snapgate_config::{CliSettings, Config};
use snapgate_store::FileStore;

use get::GetArgs;
use list::ListArgs;
use put::PutArgs;

use crate::error::CliError;

/// Snapshot store commands.
#[derive(Subcommand)]
pub(crate) enum StoreCommand {
    /// Write a page snapshot.
    Put(PutArgs),
    /// Print a page snapshot.
    Get(GetArgs),
    /// List stored paths.
    List(ListArgs),
}

impl StoreCommand {
    /// Execute the store subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Put(args) => args.execute(),
            Self::Get(args) => args.execute(),
            Self::List(args) => args.execute(),
        }
    }
}

/// Store location shared by all store commands.
#[derive(Args)]
pub(crate) struct StoreLocation {
    /// Path to configuration file (default: auto-discover snapgate.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot store directory (overrides config).
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

impl StoreLocation {
    /// Open the configured store.
    fn open(&self) -> Result<FileStore, CliError> {
        let cli_settings = CliSettings {
            store_dir: self.store_dir.clone(),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        Ok(FileStore::open(&config.paths.store_dir)?)
    }
}
