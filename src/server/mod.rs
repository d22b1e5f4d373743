//! Manual trigger server
//!
//! Always-on HTTP surface for operating the exporter outside the daily
//! schedule: a full manual export and a non-destructive destination
//! connectivity probe. Each request runs on its own task and reloads
//! options from disk, so handlers share no mutable state with the
//! scheduler loop and may overlap with it freely.
//!
//! `/manual_export` runs the whole pipeline synchronously inside the
//! handler. Worst case it holds its request for the 300s history fetch plus
//! five 300s upload attempts and their backoff; only that request's task is
//! tied up, the accept loop and other handlers are unaffected.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Options;
use crate::error::Result;
use crate::export::{uploader, Exporter};
use crate::supervisor::SupervisorClient;

/// Address the trigger server listens on
pub const BIND_ADDR: &str = "0.0.0.0:8080";

/// Shared read-only request context
#[derive(Clone)]
pub struct AppState {
    /// Options file consulted fresh on every request
    pub options_path: PathBuf,

    /// Supervisor base URL
    pub supervisor_url: String,

    /// Export pipeline driver
    pub exporter: Arc<Exporter>,
}

impl AppState {
    /// Create request context for the given options file and Supervisor
    pub fn new(options_path: impl Into<PathBuf>, supervisor_url: impl Into<String>) -> Self {
        Self {
            options_path: options_path.into(),
            supervisor_url: supervisor_url.into(),
            exporter: Arc::new(Exporter::new()),
        }
    }
}

/// Build the trigger router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/manual_export", get(manual_export))
        .route("/test_endpoint", get(test_endpoint))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the trigger router until the process exits
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind trigger server to {addr}"))?;

    tracing::info!(%addr, "Trigger server listening");

    axum::serve(listener, router)
        .await
        .context("Trigger server error")?;

    Ok(())
}

/// Run a full export cycle on demand
async fn manual_export(State(state): State<AppState>) -> (StatusCode, String) {
    match run_manual_export(&state).await {
        Ok(()) => (
            StatusCode::OK,
            "Manual export triggered successfully.".to_string(),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Manual export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Manual export failed: {err}"),
            )
        }
    }
}

async fn run_manual_export(state: &AppState) -> Result<()> {
    let options = Options::load(&state.options_path)?;
    let supervisor = SupervisorClient::from_env(state.supervisor_url.as_str())?;
    let tz = supervisor.timezone().await?;

    state.exporter.run_once(&options, &supervisor, tz).await
}

/// Check destination reachability and credential acceptance without
/// touching the controller or sending real data
async fn test_endpoint(State(state): State<AppState>) -> (StatusCode, String) {
    match run_probe(&state).await {
        Ok(status) => (
            StatusCode::OK,
            format!("Test endpoint responded with status {status}"),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Test endpoint failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Test endpoint failed: {err}"),
            )
        }
    }
}

async fn run_probe(state: &AppState) -> Result<u16> {
    let options = Options::load(&state.options_path)?;

    let status = uploader::probe_destination(
        &options.destination_url,
        &options.destination_key,
        options.verify_tls,
    )
    .await?;

    Ok(status)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
