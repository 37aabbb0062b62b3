//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use snapgate_render::RenderError;
use snapgate_routes::LoadError;
use snapgate_sitemap::SitemapError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Serving port equals the prerendering port.
    #[error("Main port and prerendering port cannot be the same ({0})")]
    PortConflict(u16),

    /// Sitemap generation error.
    #[error("Sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Details stay in the log
        match &self {
            Self::Sitemap(SitemapError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
            Self::Sitemap(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
            }
            Self::PortConflict(_) | Self::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

/// Reason a dynamic page could not be rendered.
///
/// Never sent to the client; the request is served by the fallback.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PageError {
    /// Route loader failed.
    #[error("loader failed: {0}")]
    Load(#[from] LoadError),

    /// Template snapshot is not in the store.
    #[error("template '{0}' not found in store")]
    MissingTemplate(String),

    /// Template execution failed.
    #[error("template rendering failed: {0}")]
    Render(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use snapgate_sitemap::SourceError;

    use super::*;

    #[tokio::test]
    async fn test_sitemap_errors_hide_details() {
        let err = ServerError::Sitemap(SitemapError::Source {
            name: "posts".to_owned(),
            source: SourceError::new("db password rejected"),
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("password"));
    }

    #[test]
    fn test_sitemap_not_found() {
        let response = ServerError::Sitemap(SitemapError::NotFound("/sitemap/x.xml".to_owned()))
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
