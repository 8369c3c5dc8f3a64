use std::env;

/// Where the process is running, which decides default sinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A developer at a terminal.
    Interactive,
    /// A CI runner; its workspace is thrown away after the job.
    Ci,
}

impl ExecutionContext {
    /// Whether the file sink is on when the config does not say.
    pub fn default_file_logging(self) -> bool {
        matches!(self, ExecutionContext::Interactive)
    }
}

/// Detect the context from the conventional `CI` variable.
pub fn detect_context() -> ExecutionContext {
    match env::var("CI") {
        Ok(value) if is_truthy(&value) => ExecutionContext::Ci,
        _ => ExecutionContext::Interactive,
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
