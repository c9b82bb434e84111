use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use cnis_core::config_file::{self, ConfigFile};
use cnis_parsing::{CnisExtractor, ParsingConfigBuilder};
use cnis_pdf_mupdf::MupdfBackend;

mod handlers;
mod models;
mod state;
mod upload;

use state::AppState;

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_BODY_LIMIT_MB: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config_file::load_config();
    let state = Arc::new(build_state(&config)?);

    let server = config.server.clone().unwrap_or_default();
    let bind = std::env::var("CNIS_BIND")
        .ok()
        .or(server.bind)
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind:?}"))?;
    let body_limit = server
        .body_limit_mb
        .unwrap_or(DEFAULT_BODY_LIMIT_MB)
        .saturating_mul(1024 * 1024);

    let app = router(state, body_limit);

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Parsing limits: env vars > config file > defaults.
fn build_state(config: &ConfigFile) -> anyhow::Result<AppState> {
    let section = config.parsing.clone().unwrap_or_default();
    let mut builder = ParsingConfigBuilder::from_section(&section);
    if let Some(mb) = std::env::var("CNIS_MAX_INPUT_MB")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
    {
        builder = builder.max_input_bytes(mb.saturating_mul(1024 * 1024));
    }

    let mut backend = MupdfBackend::new();
    if let Some(pdf) = &config.pdf {
        if let Some(ratio) = pdf.footer_exclusion {
            backend = backend.with_footer_exclusion(ratio);
        }
        if let Some(ratio) = pdf.header_exclusion {
            backend = backend.with_header_exclusion(ratio);
        }
    }

    Ok(AppState {
        extractor: CnisExtractor::with_config(builder.build()?),
        backend,
    })
}

fn router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(handlers::health::health))
        .route("/processar_cnis", post(handlers::process::process_text))
        .route("/processar_cnis/pdf", post(handlers::process::process_pdf))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
