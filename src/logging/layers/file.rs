use crate::core::workspace::DOT_DIR;
use crate::logging::config::LoggingConfig;
use crate::Result;
use anyhow::{anyhow, Context};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::{self as tracing_fmt, format};
use tracing_subscriber::registry::LookupSpan;

pub const LOG_FILE_NAME: &str = "dot.log";

/// Layer type produced by the file sink builder.
pub type FileFmtLayer<S> =
    tracing_fmt::Layer<S, format::DefaultFields, format::Format<format::Full>, NonBlocking>;

/// `<log_dir>/dot.log`, where `log_dir` defaults to `.dot/logs` under the
/// workspace (or the home directory outside one).
pub fn log_file_path(config: &LoggingConfig, workspace_root: Option<&Path>) -> Result<PathBuf> {
    let directory = match (&config.log_dir, workspace_root) {
        (Some(custom), _) if custom.is_absolute() => custom.clone(),
        (Some(custom), Some(workspace)) => workspace.join(custom),
        (Some(custom), None) => home_base()?.join(custom),
        (None, Some(workspace)) => workspace.join(DOT_DIR).join("logs"),
        (None, None) => home_base()?.join(DOT_DIR).join("logs"),
    };
    Ok(directory.join(LOG_FILE_NAME))
}

/// Append-only file layer behind a non-blocking writer. Keep the guard alive
/// until exit or buffered lines are lost.
pub fn file_layer<S>(log_file: &Path) -> Result<(FileFmtLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let directory = log_file
        .parent()
        .ok_or_else(|| anyhow!("log file path {} has no parent directory", log_file.display()))?;
    let file_name = log_file
        .file_name()
        .ok_or_else(|| anyhow!("log file path {} has no file name", log_file.display()))?;
    create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);
    Ok((layer, guard))
}

fn home_base() -> Result<PathBuf> {
    dirs_next::home_dir().ok_or_else(|| anyhow!("$HOME directory unavailable"))
}
