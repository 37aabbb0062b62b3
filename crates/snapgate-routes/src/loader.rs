//! Per-route data loading capability.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

/// Request data handed to a [`PageLoader`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoaderContext {
    /// Canonical request path.
    pub path: String,
    /// Parameters bound by the route pattern, percent-decoded.
    pub params: BTreeMap<String, String>,
    /// Query string parameters, last duplicate wins.
    pub query: BTreeMap<String, String>,
}

/// Error raised by a [`PageLoader`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct LoadError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LoadError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Loads the data a dynamic page is rendered from.
///
/// Loaders may do network I/O and may fail. A failure never reaches the
/// client; the request is served by the fallback instead.
#[async_trait]
pub trait PageLoader: Send + Sync {
    /// Load page data for a matched request.
    async fn load(&self, ctx: &LoaderContext) -> Result<Value, LoadError>;
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_load_error_source_chain() {
        let io = std::io::Error::other("connection reset");
        let err = LoadError::with_source("fetch failed", io);

        assert_eq!(err.to_string(), "fetch failed");
        assert_eq!(err.source().map(ToString::to_string), Some("connection reset".to_owned()));
        assert!(LoadError::new("plain").source().is_none());
    }
}
