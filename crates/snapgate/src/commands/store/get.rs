//! `snapgate store get` command implementation.

use clap::Args;
use snapgate_store::PageStore;

use super::StoreLocation;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the get command.
#[derive(Args)]
pub(crate) struct GetArgs {
    #[command(flatten)]
    location: StoreLocation,

    /// Request path to look up.
    #[arg(long)]
    path: String,

    /// Print the page data as JSON instead of the HTML.
    #[arg(long)]
    data: bool,
}

impl GetArgs {
    /// Execute the get command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let store = self.location.open()?;

        let Some(entry) = store.get(&self.path) else {
            return Err(CliError::Validation(format!(
                "No snapshot stored for {}",
                self.path
            )));
        };

        if self.data {
            output.result(&serde_json::to_string_pretty(&entry.data)?);
        } else {
            output.result(&entry.html);
        }
        Ok(())
    }
}
