pub mod command;
pub mod config;
pub mod error;
pub mod git;
pub mod orchestrator;
pub mod profiles;
pub mod selector;
pub mod tool_executor;
pub mod types;
pub mod workspace;

pub use command::{BuildCommand, CommandBuilder, Flag, IsolatedPaths};
pub use config::{ConfigLoader, ConfigMerger, EffectiveConfig, ProjectConfig, Settings, VariableSpec};
pub use error::{DefaultErrorReporter, DotError, DotResult, ErrorReporter};
pub use git::{CommitIdentity, GitCli, ReferenceResolver, VersionControl};
pub use orchestrator::{Baseline, BuildOrchestrator, BuildPlan, BuildRequest};
pub use profiles::ProfileGenerator;
pub use selector::Selector;
pub use tool_executor::{BuildTool, DbtCli};
pub use types::*;
pub use workspace::{IsolatedBuildDirectory, WorkspaceManager};
