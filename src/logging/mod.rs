pub mod config;
pub mod context;
pub mod layers;

pub use context::{detect_context, ExecutionContext};
pub use layers::console::ConsoleOutput;

use crate::logging::config::LoggingConfig;
use crate::logging::layers::file::FileFmtLayer;
use crate::logging::layers::{console, file};
use crate::Result;
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, Registry};

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

type FilteredRegistry = Layered<EnvFilter, Registry>;
type FileSlot = reload::Handle<Option<FileFmtLayer<FilteredRegistry>>, FilteredRegistry>;

/// Owns the file sink: the slot it is attached to and, once open, the guard
/// that keeps it flushing until the process exits.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    file_slot: FileSlot,
    pending_log_file: Option<PathBuf>,
    context: ExecutionContext,
    log_file_path: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// The log file, once the file sink has been opened.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file_path.as_deref()
    }

    /// Create the log file and start writing to it. A no-op when the file
    /// sink is disabled or already open.
    ///
    /// Nothing is written under the workspace before this is called.
    pub fn open_file_sink(&mut self) -> Result<Option<&Path>> {
        if let Some(path) = self.pending_log_file.take() {
            let (layer, guard) = file::file_layer(&path)?;
            self.file_slot
                .reload(Some(layer))
                .context("failed to attach the log file sink")?;
            self._file_guard = Some(guard);
            tracing::debug!(log_file = %path.display(), "file logging started");
            self.log_file_path = Some(path);
        }
        Ok(self.log_file_path.as_deref())
    }
}

/// Install the global subscriber: env filter, an empty file sink slot, console sink.
///
/// `workspace_root` anchors `.dot/logging.toml` and the default log directory.
/// The log file itself is only created by [`LoggingGuard::open_file_sink`].
/// Fails when called twice in one process.
pub fn init(workspace_root: Option<&Path>) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let context = detect_context();
    let config = LoggingConfig::load(workspace_root)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;

    let pending_log_file = if config.file_enabled(context) {
        Some(file::log_file_path(&config, workspace_root)?)
    } else {
        None
    };
    let (file_slot_layer, file_slot) = reload::Layer::new(None);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_slot_layer)
        .with(console::console_layer(config.console_output))
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!(?context, log_file = ?pending_log_file, "logging initialized");

    Ok(LoggingGuard {
        _file_guard: None,
        file_slot,
        pending_log_file,
        context,
        log_file_path: None,
    })
}

/// The enclosing git checkout of `start`, found by walking up to a `.git`
/// entry; `start` itself when there is none.
pub fn resolve_workspace_path(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
}
