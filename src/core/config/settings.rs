use std::env;

pub const DBT_EXECUTABLE_ENV: &str = "DOT_DBT_EXECUTABLE";
pub const GIT_EXECUTABLE_ENV: &str = "DOT_GIT_EXECUTABLE";
pub const LOG_LEVEL_ENV: &str = "DOT_LOG_LEVEL";

/// Process-level settings taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub dbt_executable: String,
    pub git_executable: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dbt_executable: "dbt".to_string(),
            git_executable: "git".to_string(),
        }
    }
}

impl Settings {
    /// Defaults with environment variable overrides applied.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    fn apply_env_overrides(&mut self) {
        if let Some(dbt) = non_empty_var(DBT_EXECUTABLE_ENV) {
            self.dbt_executable = dbt;
        }

        if let Some(git) = non_empty_var(GIT_EXECUTABLE_ENV) {
            self.git_executable = git;
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "DOT_DBT_EXECUTABLE - dbt binary to invoke (default: dbt)",
            "DOT_GIT_EXECUTABLE - git binary to invoke (default: git)",
            "DOT_LOG_LEVEL - Override the log level (trace, debug, info, warn, error)",
        ]
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
