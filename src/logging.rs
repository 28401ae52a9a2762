//! Logging setup for the CLI.
//!
//! Console output goes to stderr so that `--json` reports on stdout stay
//! machine-readable. With `logging.dir` set, events are also written to a
//! daily-rotated `shipyard.log` in that directory.
//!
//! Filter precedence: `RUST_LOG`, then `SHIPYARD_LOG`/`logging.level`.

use crate::config::LoggingSection;
use anyhow::{Context, Result};
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub const LOG_FILE: &str = "shipyard.log";

/// Keeps the file writer alive. Dropping it flushes pending log lines.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Filter for `level`, falling back to `info` when it does not parse.
pub fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
pub fn init_logging(settings: &LoggingSection) -> Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&settings.level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    if settings.json {
        layers.push(console.json().boxed());
    } else {
        layers.push(console.boxed());
    }

    let mut file_guard = None;
    if let Some(dir) = &settings.dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        if settings.json {
            layers.push(file.json().boxed());
        } else {
            layers.push(file.boxed());
        }
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
