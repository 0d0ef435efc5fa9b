//! Logging setup for the CLI
//!
//! Console output goes to stderr so `--json` results on stdout stay clean.
//! `RUST_LOG` takes precedence over the configured filter.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

const LOG_FILE_PREFIX: &str = "steadydb.log";

/// Directory for JSON log files when none is configured
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("steadydb")
        .join("logs")
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// until the process exits.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let mut layers = Vec::new();

    if settings.console {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter(&settings.filter))
            .boxed();
        layers.push(console_layer);
    }

    let mut guard = None;
    let log_dir = settings.log_dir.clone().unwrap_or_else(log_directory);
    if settings.json_file {
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter(&settings.filter))
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_dir = %log_dir.display(),
        json_enabled = settings.json_file,
        console_enabled = settings.console,
        "logging initialized"
    );
    Ok(guard)
}
