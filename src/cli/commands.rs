use super::Args;
use crate::core::config::Settings;
use crate::core::error::{DotError, DotResult};
use crate::core::git::GitCli;
use crate::core::orchestrator::BuildOrchestrator;
use crate::core::tool_executor::DbtCli;
use crate::logging::LoggingGuard;
use std::env;

/// Plan and run one dbt invocation from the current directory.
pub fn build(args: Args, logging: Option<&mut LoggingGuard>) -> DotResult<i32> {
    let request = args.to_request()?;
    let project_dir = env::current_dir().map_err(|e| DotError::io(".", e))?;
    let settings = Settings::from_env();

    let git = GitCli::with_program(&project_dir, settings.git_executable);
    let dbt = DbtCli::new(settings.dbt_executable);
    let orchestrator = BuildOrchestrator::new(&project_dir, &git, &dbt);

    let plan = orchestrator.plan(&request)?;
    // A failed plan leaves nothing under .dot, log file included.
    if let Some(logging) = logging {
        if let Err(err) = logging.open_file_sink() {
            tracing::warn!("log file disabled: {:#}", err);
        }
    }

    if request.dry_run {
        for command in &plan.commands {
            println!("{}", command);
        }
        return Ok(0);
    }

    orchestrator.execute(&plan)
}
