use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

/// Request/response bodies are logged at debug by the client crate.
const FILE_FILTER: &str = "info,clients_binance=debug,futures_bot=debug";

/// Console on stderr (`RUST_LOG`, default `info`) plus an optional debug
/// log file. The guard must outlive the last event or the tail of the file is lost.
pub fn subscriber(
    log_file: Option<&Path>,
) -> Result<(impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>)> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file, guard) = match log_file {
        Some(path) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry().with(console).with(file);
    Ok((subscriber, guard))
}

pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let (subscriber, guard) = subscriber(log_file)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))?;
    Ok(guard)
}

fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid log file path {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| anyhow!("failed to open log file {}: {e}", path.display()))
}
