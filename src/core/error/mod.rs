use crate::core::types::ErrorCategory;
use std::path::PathBuf;

/// Result alias used throughout the orchestration core.
pub type DotResult<T> = std::result::Result<T, DotError>;

/// Every way an isolated build invocation can fail.
///
/// None of these are retried; each carries the reference, environment,
/// variable or path needed to act on it.
#[derive(Debug, thiserror::Error)]
pub enum DotError {
    #[error("invalid git reference '{reference}': {reason}")]
    InvalidRef { reference: String, reason: String },

    #[error("could not resolve git reference '{reference}': {reason}")]
    RefResolution { reference: String, reason: String },

    #[error("{} is not inside a git repository: {reason}", .path.display())]
    RepositoryNotFound { path: PathBuf, reason: String },

    #[error("failed to create worktree at {}: {reason}", .path.display())]
    WorktreeCreation { path: PathBuf, reason: String },

    #[error("{}", environment_not_found_message(.name))]
    EnvironmentNotFound { name: Option<String> },

    #[error("variable '{variable}' in environment '{environment}': {reason}")]
    VariableValidation {
        variable: String,
        environment: String,
        reason: String,
    },

    #[error(
        "both 'schema' and 'dataset' are set for target '{target}' of profile '{profile}'; \
         only one storage namespace field may be used"
    )]
    AmbiguousNamespaceField { profile: String, target: String },

    #[error(
        "no baseline build for environment '{environment}' at '{reference}': {} {reason}",
        .path.display()
    )]
    MissingBaseline {
        environment: String,
        reference: String,
        path: PathBuf,
        reason: String,
    },

    #[error("could not discover the dbt profiles directory: {0}")]
    ProfileDiscovery(String),

    #[error("invalid dbt profile in {}: {reason}", .path.display())]
    Profile { path: PathBuf, reason: String },

    #[error("invalid configuration in {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("failed to execute {program}: {source}")]
    ToolExecution {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn environment_not_found_message(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(
            "environment '{}' not found in dot_environments.yml or dot_environments.user.yml",
            name
        ),
        None => "no environment was given and no default environment is configured".to_string(),
    }
}

impl DotError {
    /// Wrap an I/O failure with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DotError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config<T: Into<String>>(path: impl Into<PathBuf>, reason: T) -> Self {
        DotError::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DotError::InvalidRef { .. } => ErrorCategory::InputError,
            DotError::RefResolution { .. }
            | DotError::RepositoryNotFound { .. }
            | DotError::WorktreeCreation { .. } => {
                ErrorCategory::VersionControlError
            }
            DotError::EnvironmentNotFound { .. }
            | DotError::VariableValidation { .. }
            | DotError::Config { .. } => ErrorCategory::ConfigurationError,
            DotError::AmbiguousNamespaceField { .. }
            | DotError::ProfileDiscovery(_)
            | DotError::Profile { .. } => ErrorCategory::ProfileError,
            DotError::MissingBaseline { .. } => ErrorCategory::BaselineError,
            DotError::ToolExecution { .. } => ErrorCategory::ToolExecutionError,
            DotError::Io { .. } => ErrorCategory::IoError,
        }
    }

    /// Stable identifier printed next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            DotError::InvalidRef { .. } => "DOT-REF-001",
            DotError::RefResolution { .. } => "DOT-REF-002",
            DotError::RepositoryNotFound { .. } => "DOT-REF-003",
            DotError::WorktreeCreation { .. } => "DOT-WT-001",
            DotError::EnvironmentNotFound { .. } => "DOT-CFG-001",
            DotError::VariableValidation { .. } => "DOT-CFG-002",
            DotError::Config { .. } => "DOT-CFG-003",
            DotError::AmbiguousNamespaceField { .. } => "DOT-PRF-001",
            DotError::ProfileDiscovery(_) => "DOT-PRF-002",
            DotError::Profile { .. } => "DOT-PRF-003",
            DotError::MissingBaseline { .. } => "DOT-DEF-001",
            DotError::ToolExecution { .. } => "DOT-EXE-001",
            DotError::Io { .. } => "DOT-IO-001",
        }
    }

    /// Hints shown after the error when the fix is not obvious from the message.
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            DotError::RefResolution { .. } => {
                vec!["Check the branch, tag or commit exists locally (git fetch may help)".to_string()]
            }
            DotError::RepositoryNotFound { .. } => vec![
                "Run dot from inside the git checkout that holds the dbt project".to_string(),
            ],
            DotError::WorktreeCreation { path, .. } => vec![
                format!("Remove {} and run `git worktree prune`", path.display()),
            ],
            DotError::MissingBaseline {
                environment,
                reference,
                ..
            } => vec![format!(
                "Build the baseline first: dot build {}@{}",
                environment, reference
            )],
            DotError::ProfileDiscovery(_) => {
                vec!["Run `dbt debug --config-dir` to check where dbt looks for profiles.yml".to_string()]
            }
            DotError::Config { .. } => vec!["Check the YAML syntax and document layout".to_string()],
            _ => vec![],
        }
    }
}

pub trait ErrorReporter {
    fn report_error(&self, error: &DotError);
    fn report_warning(&self, message: &str, context: Option<String>);
}

/// Reports through the tracing subscriber installed by `logging::init`.
pub struct DefaultErrorReporter;

impl DefaultErrorReporter {
    pub fn new() -> Self {
        DefaultErrorReporter
    }
}

impl Default for DefaultErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter for DefaultErrorReporter {
    fn report_error(&self, error: &DotError) {
        tracing::error!(code = error.code(), category = %error.category(), "{}", error);
        for suggestion in error.recovery_suggestions() {
            tracing::error!("  hint: {}", suggestion);
        }
    }

    fn report_warning(&self, message: &str, context: Option<String>) {
        match context {
            Some(ctx) => tracing::warn!(context = %ctx, "{}", message),
            None => tracing::warn!("{}", message),
        }
    }
}
