//! Static snapshot and dynamic page responses.

use std::collections::BTreeMap;

use axum::extract::Request;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use snapgate_render::{HydrationPayload, inject};
use snapgate_routes::{DynamicRoute, LoaderContext, RequestTarget};

use crate::error::PageError;
use crate::state::AppState;
use crate::strategy::{ClientClass, RouteCategory};

/// Serve a static route from its prerendered snapshot.
///
/// Skipped clients and store misses get the fallback.
pub(crate) async fn serve_static(
    state: &AppState,
    target: &RequestTarget,
    client: ClientClass,
    req: Request,
) -> Response {
    if !state.policy.allows(RouteCategory::Static, client) {
        tracing::debug!(path = %target.path, ?client, "Static rendering skipped for client");
        return state.fallback.serve(req).await;
    }

    let Some(entry) = state.store.get(&target.path) else {
        tracing::debug!(path = %target.path, "Static snapshot not in store");
        return state.fallback.serve(req).await;
    };

    let payload = HydrationPayload::new(entry.data, &target.path);
    html_response(inject(&entry.html, &payload.script(), state.injection))
}

/// Serve a dynamic route by rendering its template against loaded data.
///
/// Any failure is logged and answered by the fallback.
pub(crate) async fn serve_dynamic(
    state: &AppState,
    route: &DynamicRoute,
    params: BTreeMap<String, String>,
    target: &RequestTarget,
    client: ClientClass,
    req: Request,
) -> Response {
    if !state.policy.allows(RouteCategory::Dynamic, client) {
        tracing::debug!(path = %target.path, ?client, "Dynamic rendering skipped for client");
        return state.fallback.serve(req).await;
    }

    match render_dynamic(state, route, params, target).await {
        Ok(html) => html_response(html),
        Err(e) => {
            log_failure(&e, route, target);
            state.fallback.serve(req).await
        }
    }
}

async fn render_dynamic(
    state: &AppState,
    route: &DynamicRoute,
    params: BTreeMap<String, String>,
    target: &RequestTarget,
) -> Result<String, PageError> {
    let ctx = LoaderContext {
        path: target.path.clone(),
        params,
        query: target.query.clone(),
    };
    let data = route.loader.load(&ctx).await?;

    let template = state
        .store
        .get(&route.template_route)
        .ok_or_else(|| PageError::MissingTemplate(route.template_route.clone()))?;
    let html = state.engine.render(&template.html, &data)?;

    let payload = HydrationPayload::new(data, &ctx.path);
    Ok(inject(&html, &payload.script(), state.injection))
}

fn log_failure(error: &PageError, route: &DynamicRoute, target: &RequestTarget) {
    let pattern = route.pattern.as_str();
    match error {
        PageError::MissingTemplate(_) => {
            tracing::warn!(path = %target.path, route = pattern, error = %error, "Serving fallback");
        }
        PageError::Load(_) | PageError::Render(_) => {
            tracing::error!(path = %target.path, route = pattern, error = %error, "Serving fallback");
        }
    }
}

fn html_response(html: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        html,
    )
        .into_response()
}
