//! snapgate CLI - Prerendering gateway.
//!
//! Provides commands for:
//! - `serve`: Start the gateway
//! - `store put`: Write a page snapshot
//! - `store get`: Print a page snapshot
//! - `store list`: List snapshot paths

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ServeArgs, StoreCommand};
use error::CliError;
use output::Output;

/// snapgate - Prerendering gateway.
#[derive(Parser)]
#[command(name = "snapgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway.
    Serve(ServeArgs),
    /// Inspect and populate the snapshot store.
    #[command(subcommand)]
    Store(StoreCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Check if verbose flag is set for serve command
    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
        Commands::Store(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
