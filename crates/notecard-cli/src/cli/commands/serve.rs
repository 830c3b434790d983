//! `notecard serve`.

use std::sync::Arc;

use anyhow::{Context, Result};
use notecard::logging;
use notecard::server::{self, AppState};
use notecard::source::FileContentSource;
use notecard_core::config::Config;
use tokio::net::TcpListener;
use tracing::info;

pub async fn run(config: &Config) -> Result<()> {
    let _log_guard = logging::init(&config.logging)?;

    let content_dir = config.content_dir();
    info!(dir = %content_dir.display(), "resolving content from directory");
    let state = AppState::from_config(config, FileContentSource::new(content_dir))?;

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("bind {}", config.server.bind))?;
    server::serve(listener, Arc::new(state)).await
}
