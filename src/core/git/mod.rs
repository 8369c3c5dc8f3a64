mod resolve;

pub use resolve::{CommitIdentity, ReferenceResolver};

use crate::core::error::{DotError, DotResult};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// The git operations the orchestrator needs.
///
/// Implementations must be read-only except for `add_detached_worktree` and
/// `prune_worktrees`.
pub trait VersionControl {
    /// Absolute path of the repository's top-level directory.
    fn repository_root(&self) -> DotResult<PathBuf>;

    /// Resolve a reference to the full hash of the commit it points at.
    fn rev_parse_commit(&self, reference: &str) -> DotResult<String>;

    /// Shortest unambiguous abbreviation of a full commit hash.
    fn abbreviate(&self, full_hash: &str) -> DotResult<String>;

    /// Check out `full_hash` into `path` as a detached worktree.
    fn add_detached_worktree(&self, path: &Path, full_hash: &str) -> DotResult<()>;

    /// Drop administrative entries for worktrees whose directories are gone.
    fn prune_worktrees(&self) -> DotResult<()>;

    /// The commit checked out in an existing worktree, or `None` when the
    /// directory is not a usable checkout.
    fn checkout_head(&self, worktree: &Path) -> Option<String>;
}

/// `VersionControl` backed by the `git` binary.
pub struct GitCli {
    program: String,
    repo_path: PathBuf,
}

impl GitCli {
    /// Create a GitCli operating on the repository containing `repo_path`
    pub fn new(repo_path: &Path) -> Self {
        Self::with_program(repo_path, "git")
    }

    pub fn with_program(repo_path: &Path, program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            repo_path: repo_path.to_path_buf(),
        }
    }

    fn run<A: AsRef<OsStr> + fmt::Debug>(&self, cwd: &Path, args: &[A]) -> DotResult<Output> {
        tracing::debug!(program = %self.program, cwd = %cwd.display(), ?args, "running git");
        Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|source| DotError::ToolExecution {
                program: self.program.clone(),
                source,
            })
    }
}

fn stderr_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("git exited with {}", output.status)
    } else {
        stderr
    }
}

fn stdout_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A path printed by git, kept byte for byte.
fn stdout_path(output: &Output) -> PathBuf {
    let mut bytes = output.stdout.as_slice();
    while let [rest @ .., b'\n' | b'\r'] = bytes {
        bytes = rest;
    }
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(OsStr::from_bytes(bytes))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
    }
}

impl VersionControl for GitCli {
    fn repository_root(&self) -> DotResult<PathBuf> {
        let output = self.run(&self.repo_path, &["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            return Err(DotError::RepositoryNotFound {
                path: self.repo_path.clone(),
                reason: stderr_reason(&output),
            });
        }
        Ok(stdout_path(&output))
    }

    fn rev_parse_commit(&self, reference: &str) -> DotResult<String> {
        let spec = format!("{}^{{commit}}", reference);
        let output = self.run(&self.repo_path, &["rev-parse", "--verify", spec.as_str()])?;
        if !output.status.success() {
            return Err(DotError::RefResolution {
                reference: reference.to_string(),
                reason: stderr_reason(&output),
            });
        }
        Ok(stdout_line(&output))
    }

    fn abbreviate(&self, full_hash: &str) -> DotResult<String> {
        let output = self.run(&self.repo_path, &["rev-parse", "--short", full_hash])?;
        if !output.status.success() {
            return Err(DotError::RefResolution {
                reference: full_hash.to_string(),
                reason: stderr_reason(&output),
            });
        }
        Ok(stdout_line(&output))
    }

    fn add_detached_worktree(&self, path: &Path, full_hash: &str) -> DotResult<()> {
        let output = self.run(
            &self.repo_path,
            &[
                OsStr::new("worktree"),
                OsStr::new("add"),
                OsStr::new("--detach"),
                path.as_os_str(),
                OsStr::new(full_hash),
            ],
        )?;
        if !output.status.success() {
            return Err(DotError::WorktreeCreation {
                path: path.to_path_buf(),
                reason: stderr_reason(&output),
            });
        }
        Ok(())
    }

    fn prune_worktrees(&self) -> DotResult<()> {
        let output = self.run(&self.repo_path, &["worktree", "prune"])?;
        if !output.status.success() {
            return Err(DotError::WorktreeCreation {
                path: self.repo_path.clone(),
                reason: format!("git worktree prune failed: {}", stderr_reason(&output)),
            });
        }
        Ok(())
    }

    fn checkout_head(&self, worktree: &Path) -> Option<String> {
        // A linked worktree carries a `.git` file pointing back at the main repository.
        if !worktree.join(".git").exists() {
            return None;
        }
        let output = self.run(worktree, &["rev-parse", "HEAD"]).ok()?;
        output.status.success().then(|| stdout_line(&output))
    }
}
