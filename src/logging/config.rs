use crate::core::config::settings::LOG_LEVEL_ENV;
use crate::core::workspace::DOT_DIR;
use crate::logging::context::ExecutionContext;
use crate::logging::layers::console::ConsoleOutput;
use crate::Result;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

const DEFAULT_LEVEL: &str = "info";
pub const LOGGING_CONFIG_FILE: &str = "logging.toml";

/// Resolved logging configuration: defaults, then `.dot/logging.toml`, then
/// `DOT_LOG_LEVEL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
    pub default_level: String,
    /// `None` defers to the execution context.
    pub enable_file: Option<bool>,
    pub console_output: ConsoleOutput,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_level: DEFAULT_LEVEL.to_string(),
            enable_file: None,
            console_output: ConsoleOutput::default(),
        }
    }
}

impl LoggingConfig {
    pub fn load(workspace_root: Option<&Path>) -> Result<Self> {
        let mut config = LoggingConfig::default();
        if let Some(workspace) = workspace_root {
            let path = workspace.join(DOT_DIR).join(LOGGING_CONFIG_FILE);
            if let Some(file) = Self::load_from_file(&path)? {
                config.apply(file);
            }
        }
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Whether to write the log file in `context`.
    pub fn file_enabled(&self, context: ExecutionContext) -> bool {
        self.enable_file
            .unwrap_or_else(|| context.default_file_logging())
    }

    fn load_from_file(path: &Path) -> Result<Option<TomlLogging>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read logging config {}", path.display()))?;
        let parsed: TomlLogging = toml::from_str(&content)
            .with_context(|| format!("failed to parse logging config {}", path.display()))?;
        Ok(Some(parsed))
    }

    fn apply(&mut self, file: TomlLogging) {
        let Some(logging) = file.logging else {
            return;
        };
        if let Some(log_dir) = logging.log_dir {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
        if let Some(default_level) = logging.default_level {
            self.default_level = default_level;
        }
        if logging.enable_file.is_some() {
            self.enable_file = logging.enable_file;
        }
        if let Some(console_output) = logging.console_output {
            self.console_output = console_output;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                self.default_level = level.trim().to_string();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level).map_err(|_| {
            anyhow!(
                "invalid log level '{}': expected a tracing directive such as 'info' or 'dot=debug'",
                self.default_level
            )
        })?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TomlLogging {
    logging: Option<TomlLoggingSection>,
}

#[derive(Debug, Deserialize)]
struct TomlLoggingSection {
    log_dir: Option<String>,
    default_level: Option<String>,
    enable_file: Option<bool>,
    #[serde(default)]
    console_output: Option<ConsoleOutput>,
}
