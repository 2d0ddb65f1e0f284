use super::{AppState, json_response};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;

/// Serves the snapshot files written by `cogsync fetch`.
pub async fn handler(
    Path(file): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    if state.store.resolve(&file).is_none() {
        return Err((StatusCode::FORBIDDEN, "Forbidden".to_string()));
    }

    match state.store.read_raw(&file) {
        Ok(Some(content)) => Ok(json_response(StatusCode::OK, content)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Not found".to_string())),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
