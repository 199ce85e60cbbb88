use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::env::ensure_data_dir;
use configs::AppConfig;
use service::notes::{repository::NoteRepository, FileNoteRepository, NoteService};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the notes store described by `cfg` and build the application router.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    ensure_data_dir(&cfg.storage.data_dir).await?;
    let repo = FileNoteRepository::open(cfg.storage.notes_path()).await?;
    let repo: Arc<dyn NoteRepository> = repo;
    let state = ServerState::new(NoteService::new(repo));
    Ok(routes::build_router(state, build_cors()))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    let addr = cfg.server.bind_addr();
    addr.parse()
        .map_err(|e| StartupError::InvalidConfig(format!("cannot parse bind address {addr}: {e}")))
}

/// Public entry: load config, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load()?;
    run_with_config(cfg).await
}

pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg)?;
    info!(%addr, notes_file = %cfg.storage.notes_path().display(), "starting notes server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
