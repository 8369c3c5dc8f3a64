use crate::core::command::{BuildCommand, CommandBuilder, IsolatedPaths};
use crate::core::config::{ConfigLoader, ConfigMerger, EffectiveConfig, ProjectConfig};
use crate::core::error::{DotError, DotResult};
use crate::core::git::{ReferenceResolver, VersionControl};
use crate::core::profiles::{ProfileGenerator, ProfileRequest};
use crate::core::selector::Selector;
use crate::core::tool_executor::BuildTool;
use crate::core::workspace::{IsolatedBuildDirectory, WorkspaceManager};
use std::path::{Path, PathBuf};

/// Sub-command that installs package dependencies.
pub const DEPS_SUBCOMMAND: &str = "deps";
/// Artifact a deferral baseline must contain.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One `dot` invocation as parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequest {
    pub subcommand: String,
    pub target: Selector,
    pub defer: Option<Selector>,
    pub passthrough: Vec<String>,
    pub no_deps: bool,
    pub dry_run: bool,
}

impl BuildRequest {
    /// Dependencies are installed first only in a fresh isolated checkout.
    pub fn wants_deps(&self) -> bool {
        self.target.is_isolated()
            && self.subcommand != DEPS_SUBCOMMAND
            && !self.no_deps
            && !self.dry_run
    }
}

/// A resolved deferral baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub environment: String,
    pub reference: String,
    pub state_path: PathBuf,
}

/// Everything needed to run one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub commands: Vec<BuildCommand>,
    pub working_dir: PathBuf,
    pub environment: Option<String>,
    pub isolated: Option<IsolatedBuildDirectory>,
    pub baseline: Option<Baseline>,
}

/// Wires configuration, git, workspace, profile and command assembly together.
pub struct BuildOrchestrator<'a> {
    project_dir: PathBuf,
    vcs: &'a dyn VersionControl,
    tool: &'a dyn BuildTool,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(project_dir: &Path, vcs: &'a dyn VersionControl, tool: &'a dyn BuildTool) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            vcs,
            tool,
        }
    }

    /// Prepare every command for `request` without running any of them.
    ///
    /// Nothing is created on disk until configuration and deferral have been
    /// validated.
    pub fn plan(&self, request: &BuildRequest) -> DotResult<BuildPlan> {
        let config = ConfigLoader::load_from_project(&self.project_dir)?;
        let merger = ConfigMerger::new(&config);
        let effective = merger.resolve(request.target.environment.as_deref())?;

        let baseline = match &request.defer {
            Some(defer) => Some(self.resolve_baseline(&merger, &config, defer)?),
            None => None,
        };

        match request.target.reference.as_deref() {
            Some(reference) => self.plan_isolated(request, &effective, reference, baseline),
            None => self.plan_in_place(request, &effective, baseline),
        }
    }

    /// Run the plan's commands in order, stopping at the first failure.
    pub fn execute(&self, plan: &BuildPlan) -> DotResult<i32> {
        for command in &plan.commands {
            tracing::info!(command = %command, cwd = %plan.working_dir.display(), "running");
            let code = self.tool.execute(command, &plan.working_dir)?;
            if code != 0 {
                tracing::debug!(code, subcommand = command.subcommand(), "command failed");
                return Ok(code);
            }
        }
        Ok(0)
    }

    fn plan_in_place(
        &self,
        request: &BuildRequest,
        effective: &EffectiveConfig,
        baseline: Option<Baseline>,
    ) -> DotResult<BuildPlan> {
        let mut builder =
            CommandBuilder::new(self.tool.program(), &request.subcommand).with_config(effective)?;
        if let Some(baseline) = &baseline {
            builder = builder.with_deferral(&baseline.state_path);
        }
        let command = builder.with_passthrough(&request.passthrough).build();

        Ok(BuildPlan {
            commands: vec![command],
            working_dir: self.project_dir.clone(),
            environment: effective.environment().map(str::to_string),
            isolated: None,
            baseline,
        })
    }

    fn plan_isolated(
        &self,
        request: &BuildRequest,
        effective: &EffectiveConfig,
        reference: &str,
        baseline: Option<Baseline>,
    ) -> DotResult<BuildPlan> {
        // Build outputs are partitioned per environment, so one is required here.
        let environment = effective
            .environment()
            .map(str::to_string)
            .ok_or(DotError::EnvironmentNotFound { name: None })?;
        let target = effective.target().unwrap_or_else(|| environment.clone());

        let repo_root = self.vcs.repository_root()?;
        let relative_project = self.project_relative_to(&repo_root)?;
        let identity = ReferenceResolver::new(self.vcs).resolve(reference)?;

        let directory = WorkspaceManager::new(&repo_root, self.vcs).ensure(&identity)?;
        let isolated_project = directory.project_dir(&relative_project);

        let profiles_file = directory.profiles_file(&environment);
        ProfileGenerator::new(self.tool).generate(&ProfileRequest {
            source_project_dir: &self.project_dir,
            isolated_project_dir: &isolated_project,
            target: &target,
            short_hash: identity.short_hash(),
            destination: &profiles_file,
        })?;

        let paths = IsolatedPaths {
            project_dir: isolated_project.clone(),
            profiles_dir: directory.environment_dir(&environment),
            target_path: directory.target_path(&environment),
            log_path: directory.log_path(&environment),
            target,
        };

        let mut commands = Vec::new();
        if request.wants_deps() {
            commands.push(
                CommandBuilder::new(self.tool.program(), DEPS_SUBCOMMAND)
                    .with_config(effective)?
                    .with_isolation(&paths)
                    .build(),
            );
        }

        let mut builder = CommandBuilder::new(self.tool.program(), &request.subcommand)
            .with_config(effective)?
            .with_isolation(&paths);
        if let Some(baseline) = &baseline {
            builder = builder.with_deferral(&baseline.state_path);
        }
        commands.push(builder.with_passthrough(&request.passthrough).build());

        tracing::debug!(
            commit = %identity,
            environment = %environment,
            commands = commands.len(),
            "planned isolated build"
        );

        Ok(BuildPlan {
            commands,
            working_dir: isolated_project,
            environment: Some(environment),
            isolated: Some(directory),
            baseline,
        })
    }

    /// Locate an existing baseline build. Baselines are never built here.
    fn resolve_baseline(
        &self,
        merger: &ConfigMerger<'_>,
        config: &ProjectConfig,
        defer: &Selector,
    ) -> DotResult<Baseline> {
        let reference = defer.reference.as_deref().ok_or_else(|| DotError::InvalidRef {
            reference: String::new(),
            reason: "deferral needs a git reference".to_string(),
        })?;

        let environment = match defer.environment.as_deref() {
            Some(name) => merger
                .select_environment(Some(name))?
                .ok_or_else(|| DotError::EnvironmentNotFound {
                    name: Some(name.to_string()),
                })?,
            None => config
                .default_environment()
                .map(str::to_string)
                .ok_or(DotError::EnvironmentNotFound { name: None })
                .and_then(|name| {
                    merger
                        .select_environment(Some(&name))?
                        .ok_or(DotError::EnvironmentNotFound { name: Some(name) })
                })?,
        };

        let repo_root = self.vcs.repository_root()?;
        let identity = ReferenceResolver::new(self.vcs).resolve(reference)?;
        let directory = IsolatedBuildDirectory::new(&repo_root, identity.short_hash());
        let state_path = directory.target_path(&environment);

        let missing = |reason: &str| DotError::MissingBaseline {
            environment: environment.clone(),
            reference: reference.to_string(),
            path: state_path.clone(),
            reason: reason.to_string(),
        };
        if !state_path.is_dir() {
            return Err(missing("does not exist"));
        }
        if !state_path.join(MANIFEST_FILE).is_file() {
            return Err(missing("has no manifest.json"));
        }

        tracing::debug!(
            environment = %environment,
            commit = %identity,
            state = %state_path.display(),
            "deferring to baseline"
        );
        Ok(Baseline {
            environment,
            reference: reference.to_string(),
            state_path,
        })
    }

    /// The project directory relative to the repository root.
    fn project_relative_to(&self, repo_root: &Path) -> DotResult<PathBuf> {
        let project = self
            .project_dir
            .canonicalize()
            .map_err(|e| DotError::io(&self.project_dir, e))?;
        let root = repo_root
            .canonicalize()
            .map_err(|e| DotError::io(repo_root, e))?;

        project
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .map_err(|_| DotError::WorktreeCreation {
                path: self.project_dir.clone(),
                reason: format!(
                    "project directory is not inside the repository at {}",
                    root.display()
                ),
            })
    }
}
