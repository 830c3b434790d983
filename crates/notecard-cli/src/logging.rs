//! Tracing subscriber setup.

use anyhow::{Context, Result};
use notecard_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const LOG_FILE_PREFIX: &str = "notecard.log";

/// Keeps the file writer flushing; drop it only at shutdown.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber: stderr always, daily files when `config.dir` is set.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file, guard) = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(LogGuard { _file: guard })
}
