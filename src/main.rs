//! Skillshelf server
//!
//! - Axum HTTP + WebSocket API in front of the remote skill-catalog backend
//! - Static SPA fallback (`$STATIC_DIR/index.html`)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   APP_CONFIG_PATH   : path to TOML config
//!   BACKEND_BASE_URL  : remote API root (default "http://localhost:8080")
//!   CREDENTIALS_PATH  : file that keeps the token across restarts
//!   STATIC_DIR        : front-end build directory (default "./static")
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use skillshelf::config::AppConfig;
use skillshelf::routes::build_router;
use skillshelf::state::AppState;
use skillshelf::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::load_from_env();
  let state = Arc::new(AppState::new(config).await?);

  let static_dir = std::env::var("STATIC_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./static"));
  let app = build_router(state.clone(), &static_dir);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "skillshelf", %addr, backend = %state.backend.base_url, static_dir = %static_dir.display(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "skillshelf", error = %e, "Failed to listen for ctrl-c; running until killed");
    std::future::pending::<()>().await;
  }
  info!(target: "skillshelf", "Shutting down");
}
