//! dossier-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! ledger and the storage root, and serves the API plus the stored files over
//! HTTP.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use dossier_api::{AppState, SubjectLocks};
use dossier_storage::{StorageLayout, StorageRoot};
use dossier_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Dossier document submission server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path   = expand_tilde(&server_cfg.store_path);
  let storage_root = expand_tilde(&server_cfg.storage_root);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let layout = StorageLayout::init(StorageRoot::new(storage_root.clone()))
    .await
    .with_context(|| format!("failed to prepare storage root {storage_root:?}"))?;

  let state = AppState {
    store:  Arc::new(store),
    layout: Arc::new(layout),
    config: Arc::new(server_cfg.api_config()),
    locks:  SubjectLocks::new(),
  };

  let app = dossier_api::router(state)
    .nest_service("/uploads", ServeDir::new(&storage_root))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!(root = %storage_root.display(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
