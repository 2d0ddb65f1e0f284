use super::{AppState, json_response};
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::Response,
};
use serde_json::json;
use std::sync::Arc;

/// Same-origin pass-through to the Discogs API.
///
/// `/api/user-info` is answered locally so the browser learns whose
/// collection it is showing without ever seeing the token.
pub async fn handler(uri: Uri, State(state): State<Arc<AppState>>) -> Response {
    let api_path = uri.path().strip_prefix("/api").unwrap_or(uri.path());

    if api_path == "/user-info" {
        let body = json!({ "username": state.discogs.username });
        return json_response(StatusCode::OK, body.to_string());
    }

    let url = state.discogs.proxy_url(api_path, uri.query());
    tracing::debug!(%url, "Proxying request to Discogs");

    let upstream = match state.client.request(url).send().await {
        Ok(upstream) => upstream,
        Err(e) => return proxy_error(e),
    };

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    match upstream.bytes().await {
        Ok(body) => json_response(status, body),
        Err(e) => proxy_error(e),
    }
}

fn proxy_error(e: reqwest::Error) -> Response {
    tracing::warn!(error = %e, "Discogs proxy request failed");
    let body = json!({ "error": e.to_string() });
    json_response(StatusCode::INTERNAL_SERVER_ERROR, body.to_string())
}
