//! `snapgate store list` command implementation.

use clap::Args;

use super::StoreLocation;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    location: StoreLocation,
}

impl ListArgs {
    /// Execute the list command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let store = self.location.open()?;

        let keys = store.keys()?;
        if keys.is_empty() {
            output.warning(&format!("Store {} is empty", store.root().display()));
        }
        for key in keys {
            output.result(&key);
        }
        Ok(())
    }
}
