//! CLI command implementations.

pub(crate) mod serve;
pub(crate) mod store;

pub(crate) use serve::ServeArgs;
pub(crate) use store::StoreCommand;
