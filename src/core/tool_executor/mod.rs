use crate::core::command::BuildCommand;
use crate::core::error::{DotError, DotResult};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// The dbt operations the orchestrator needs.
pub trait BuildTool {
    /// Program name used for assembled commands.
    fn program(&self) -> &str;

    /// Run `command` in `cwd` with the terminal attached and return its exit code.
    fn execute(&self, command: &BuildCommand, cwd: &Path) -> DotResult<i32>;

    /// Captured stdout of `debug --config-dir --log-format json` run in `project_dir`.
    fn config_dir_report(&self, project_dir: &Path) -> DotResult<String>;
}

/// `BuildTool` backed by the dbt binary.
pub struct DbtCli {
    program: String,
}

impl DbtCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> DotError {
        DotError::ToolExecution {
            program: self.program.clone(),
            source,
        }
    }
}

impl Default for DbtCli {
    fn default() -> Self {
        Self::new("dbt")
    }
}

impl BuildTool for DbtCli {
    fn program(&self) -> &str {
        &self.program
    }

    fn execute(&self, command: &BuildCommand, cwd: &Path) -> DotResult<i32> {
        tracing::debug!(cwd = %cwd.display(), command = %command, "executing dbt");

        let status = Command::new(command.program())
            .args(command.args())
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.spawn_error(e))?;

        let code = exit_code(status);
        tracing::debug!(code, "dbt finished");
        Ok(code)
    }

    fn config_dir_report(&self, project_dir: &Path) -> DotResult<String> {
        let args = ["debug", "--config-dir", "--log-format", "json"];
        tracing::debug!(cwd = %project_dir.display(), ?args, "asking dbt for its profiles directory");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DotError::ProfileDiscovery(format!(
                "`{} debug --config-dir` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Shell-style exit code; signals map to 128 + signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
