//! Sitemap documents.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use snapgate_sitemap::SitemapError;

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /sitemap.xml and /sitemap/{document}.xml.
pub(crate) async fn get_sitemap(state: &AppState, path: &str) -> Result<Response, ServerError> {
    let xml = state.sitemap.render(path).await.inspect_err(|e| {
        if !matches!(e, SitemapError::NotFound(_)) {
            tracing::error!(path, error = %e, "Sitemap generation failed");
        }
    })?;

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}
