//! CLI error types.

use snapgate_config::ConfigError;
use snapgate_server::ServerError;
use snapgate_sources::SourcesError;
use snapgate_store::StoreError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Sources(#[from] SourcesError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("Invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
