//! HTTP request handlers.

pub(crate) mod pages;
pub(crate) mod sitemap;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::uri::PathAndQuery;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use snapgate_routes::{Classification, RequestTarget};

use crate::state::AppState;
use crate::strategy::classify_client;

/// Dispatch a GET or HEAD request by its route classification.
///
/// Other methods get `405 Method Not Allowed` on every path.
pub(crate) async fn gateway(State(state): State<Arc<AppState>>, req: Request) -> Response {
    if !matches!(*req.method(), Method::GET | Method::HEAD) {
        tracing::debug!(method = %req.method(), path = req.uri().path(), "Method not allowed");
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response();
    }

    let target = RequestTarget::parse(req.uri().path_and_query().map_or("/", PathAndQuery::as_str));
    let client = classify_client(
        req.headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
    );

    match state.routes.classify(&target) {
        Classification::TemplateOnly => {
            tracing::debug!(path = %target.path, "Template route requested directly");
            StatusCode::NOT_FOUND.into_response()
        }
        Classification::Sitemap => sitemap::get_sitemap(&state, &target.path)
            .await
            .into_response(),
        Classification::Static => pages::serve_static(&state, &target, client, req).await,
        Classification::Dynamic { route, params } => {
            pages::serve_dynamic(&state, route, params, &target, client, req).await
        }
        Classification::Unmatched => state.fallback.serve(req).await,
    }
}
