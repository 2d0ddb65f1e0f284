mod data;
mod proxy;

use crate::{
    config::{DiscogsConfig, ServeConfig},
    discogs::DiscogsClient,
    pacer::TokioClock,
    snapshot::SnapshotStore,
};
use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::{path::Path, sync::Arc};
use tower_http::{services::ServeFile, trace::TraceLayer};
use tracing::info;

pub struct AppState {
    pub client: DiscogsClient,
    pub discogs: DiscogsConfig,
    pub store: SnapshotStore,
}

impl AppState {
    pub fn new(discogs: DiscogsConfig) -> Result<Self> {
        let client = DiscogsClient::new(&discogs, Arc::new(TokioClock))
            .context("Failed to build Discogs HTTP client")?;
        let store = SnapshotStore::new(discogs.data_dir.clone());
        Ok(Self {
            client,
            discogs,
            store,
        })
    }
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// JSON body readable from any origin, as the front end expects.
fn json_response(status: StatusCode, body: impl Into<Body>) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        body.into(),
    )
        .into_response()
}

pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let index = ServeFile::new(static_dir.join("index.html"));

    Router::new()
        .route_service("/", index.clone())
        .route_service("/index.html", index)
        .route("/api/*path", get(proxy::handler))
        .route("/data/*file", get(data::handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ServeConfig) -> Result<()> {
    config
        .discogs
        .validate()
        .context("Invalid Discogs credentials")?;

    let state = Arc::new(AppState::new(config.discogs.clone())?);
    let app = router(state, &config.static_dir);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running at http://{}", addr);
    info!("Static files: {}", config.static_dir.display());
    info!("Data directory: {}", config.discogs.data_dir.display());

    axum::serve(listener, app).await?;

    Ok(())
}
