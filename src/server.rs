//! HTTP adapter over the resolver.
//!
//! - `GET /health`: liveness
//! - `GET /api/resolve?path=...`: the outcome as JSON, always 200
//! - any other `GET`: 200 with the page record, 301 to the canonical
//!   location, or 404

use crate::resolve::{PathResolver, ResolutionOutcome};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    path: String,
}

pub fn router(resolver: Arc<PathResolver>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/resolve", get(resolve_api))
        .fallback(resolve_page)
        .layer(TraceLayer::new_for_http())
        .with_state(resolver)
}

pub async fn serve(resolver: PathResolver, port: u16) -> Result<()> {
    let app = router(Arc::new(resolver));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

async fn health() -> &'static str {
    "ok"
}

async fn resolve_api(
    State(resolver): State<Arc<PathResolver>>,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolutionOutcome> {
    Json(resolver.resolve_path(&query.path).await)
}

async fn resolve_page(
    State(resolver): State<Arc<PathResolver>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match resolver.resolve_path(uri.path()).await {
        found @ ResolutionOutcome::Found { .. } => Json(found).into_response(),
        ResolutionOutcome::Redirect { location } => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, location)],
        )
            .into_response(),
        ResolutionOutcome::NotFound => {
            (StatusCode::NOT_FOUND, Json(ResolutionOutcome::NotFound)).into_response()
        }
    }
}
