use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// A user-supplied reference or selector is malformed.
    InputError,
    /// Git could not resolve a reference or materialize a checkout.
    VersionControlError,
    /// Configuration files are malformed or semantically invalid.
    ConfigurationError,
    /// The dbt connection profile could not be located or rewritten.
    ProfileError,
    /// A deferral baseline is missing.
    BaselineError,
    /// An external tool could not be spawned.
    ToolExecutionError,
    IoError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
