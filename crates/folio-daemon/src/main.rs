//! folio-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads config and
//! secrets, builds the catalog backend, wires middleware, and starts the HTTP
//! server. All route handlers live in `routes.rs`; shared state lives in
//! `state.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use folio_config::{secrets, FolioConfig, StorageBackend};
use folio_daemon::catalog::{Catalog, MemoryCatalog, PgCatalog};
use folio_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = folio_config::load_from_env().context("config load failed")?;
    let cfg = loaded.config;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let resolved = secrets::resolve_secrets(&cfg)?;
    if resolved.admin_token.is_none() {
        warn!(
            env = %cfg.auth.admin_token_env,
            "no admin token configured; mutating routes will refuse every request"
        );
    }

    let catalog = build_catalog(&cfg, &resolved).await?;
    let shared = Arc::new(state::AppState::new(catalog, resolved.admin_token.clone()));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_from_config(&cfg.server.cors_origins));

    let addr = cfg.bind_socket_addr()?;
    info!("folio-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn build_catalog(
    cfg: &FolioConfig,
    resolved: &secrets::ResolvedSecrets,
) -> anyhow::Result<Arc<dyn Catalog>> {
    match cfg.storage.backend {
        StorageBackend::Postgres => {
            let url = resolved.require_database_url(cfg)?;
            let pool = folio_db::connect(&cfg.database, url).await?;
            let st = folio_db::status(&pool).await?;
            if !st.has_artworks_table {
                warn!("artworks table missing; run `folio db migrate`");
            }
            info!(write_mode = ?cfg.ordering.write_mode, "catalog backend: postgres");
            Ok(Arc::new(PgCatalog::new(pool, cfg.ordering.clone())))
        }
        StorageBackend::Memory => {
            warn!("catalog backend: memory (data is lost on restart)");
            Ok(Arc::new(MemoryCatalog::new(cfg.ordering.clone())))
        }
    }
}

/// CORS: allow only the configured origins.
fn cors_from_config(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
    info!("shutdown requested");
}
