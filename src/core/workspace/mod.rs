//! Isolated build directories and the detached worktrees inside them.
//!
//! Layout under the repository root:
//!
//! ```text
//! .dot/build/<short_hash>/
//!     worktree/          detached checkout of the full hash
//!     commit             full hash, one line
//!     <environment>/     profiles.yml, target/, logs/
//! ```
//!
//! Two processes building the same commit and environment at the same time
//! race on the check-then-create below; nothing here serializes them.

use crate::core::error::{DotError, DotResult};
use crate::core::git::{CommitIdentity, VersionControl};
use std::fs;
use std::path::{Path, PathBuf};

pub const DOT_DIR: &str = ".dot";
pub const BUILD_DIR: &str = "build";
pub const WORKTREE_DIR: &str = "worktree";
pub const COMMIT_FILE: &str = "commit";
pub const PROFILES_FILE: &str = "profiles.yml";
pub const TARGET_DIR: &str = "target";
pub const LOGS_DIR: &str = "logs";

/// Paths of one commit's isolated build scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedBuildDirectory {
    root: PathBuf,
    short_hash: String,
}

impl IsolatedBuildDirectory {
    pub fn new(repo_root: &Path, short_hash: &str) -> Self {
        Self {
            root: repo_root.join(DOT_DIR).join(BUILD_DIR).join(short_hash),
            short_hash: short_hash.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn short_hash(&self) -> &str {
        &self.short_hash
    }

    pub fn worktree_path(&self) -> PathBuf {
        self.root.join(WORKTREE_DIR)
    }

    pub fn commit_file(&self) -> PathBuf {
        self.root.join(COMMIT_FILE)
    }

    /// Per-environment directory; also the `--profiles-dir` for that environment.
    pub fn environment_dir(&self, environment: &str) -> PathBuf {
        self.root.join(environment)
    }

    pub fn profiles_file(&self, environment: &str) -> PathBuf {
        self.environment_dir(environment).join(PROFILES_FILE)
    }

    pub fn target_path(&self, environment: &str) -> PathBuf {
        self.environment_dir(environment).join(TARGET_DIR)
    }

    pub fn log_path(&self, environment: &str) -> PathBuf {
        self.environment_dir(environment).join(LOGS_DIR)
    }

    /// The dbt project inside the worktree, given its location relative to
    /// the repository root.
    pub fn project_dir(&self, relative_project: &Path) -> PathBuf {
        if relative_project.as_os_str().is_empty() {
            return self.worktree_path();
        }
        self.worktree_path().join(relative_project)
    }
}

/// Creates and validates isolated worktrees.
pub struct WorkspaceManager<'a> {
    repo_root: PathBuf,
    vcs: &'a dyn VersionControl,
}

impl<'a> WorkspaceManager<'a> {
    pub fn new(repo_root: &Path, vcs: &'a dyn VersionControl) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            vcs,
        }
    }

    pub fn directory_for(&self, short_hash: &str) -> IsolatedBuildDirectory {
        IsolatedBuildDirectory::new(&self.repo_root, short_hash)
    }

    /// Guarantee a detached checkout of `identity` exists, creating or
    /// recreating it as needed.
    pub fn ensure(&self, identity: &CommitIdentity) -> DotResult<IsolatedBuildDirectory> {
        let directory = self.directory_for(identity.short_hash());
        let worktree = directory.worktree_path();

        if worktree.exists() {
            match self.vcs.checkout_head(&worktree) {
                Some(head) if head == identity.full_hash() => {
                    tracing::debug!(worktree = %worktree.display(), "reusing existing worktree");
                }
                head => {
                    tracing::warn!(
                        worktree = %worktree.display(),
                        expected = identity.full_hash(),
                        found = head.as_deref().unwrap_or("<none>"),
                        "worktree is not a valid checkout, recreating it"
                    );
                    fs::remove_dir_all(&worktree).map_err(|e| DotError::io(&worktree, e))?;
                    self.create_worktree(&directory, identity)?;
                }
            }
        } else {
            self.create_worktree(&directory, identity)?;
        }

        self.write_commit_file(&directory, identity)?;
        Ok(directory)
    }

    fn create_worktree(
        &self,
        directory: &IsolatedBuildDirectory,
        identity: &CommitIdentity,
    ) -> DotResult<()> {
        fs::create_dir_all(directory.root()).map_err(|e| DotError::io(directory.root(), e))?;
        // Clears registrations left behind by worktree directories deleted by hand,
        // which would otherwise make `worktree add` refuse the path.
        self.vcs.prune_worktrees()?;

        let worktree = directory.worktree_path();
        tracing::info!(
            commit = identity.full_hash(),
            worktree = %worktree.display(),
            "creating detached worktree"
        );
        self.vcs
            .add_detached_worktree(&worktree, identity.full_hash())
    }

    fn write_commit_file(
        &self,
        directory: &IsolatedBuildDirectory,
        identity: &CommitIdentity,
    ) -> DotResult<()> {
        let path = directory.commit_file();
        if let Ok(existing) = fs::read_to_string(&path) {
            if existing.trim() == identity.full_hash() {
                return Ok(());
            }
        }
        fs::write(&path, format!("{}\n", identity.full_hash())).map_err(|e| DotError::io(&path, e))
    }
}
