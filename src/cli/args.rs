use crate::core::error::DotResult;
use crate::core::orchestrator::BuildRequest;
use crate::core::selector::Selector;
use clap::Parser;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dot")]
#[command(version = crate::VERSION)]
#[command(about = "Run dbt against layered environments and isolated, commit-pinned checkouts")]
#[command(help_template = super::HELP_TEMPLATE)]
#[command(after_help = super::AFTER_HELP)]
pub struct Args {
    /// Print the dbt command(s) instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the automatic `dbt deps` before isolated builds
    #[arg(long)]
    pub no_deps: bool,

    /// Defer to the isolated build of ENV at REF (`@REF` uses the default environment)
    #[arg(long, value_name = "ENV@REF")]
    pub defer: Option<String>,

    /// dbt sub-command to run (build, run, test, seed, ...)
    #[arg(value_name = "DBT_COMMAND")]
    pub dbt_command: String,

    /// Environment, optionally pinned to a git reference
    #[arg(value_name = "ENV[@REF]")]
    pub target: Option<String>,

    /// Arguments passed to dbt unchanged
    #[arg(last = true, value_name = "DBT_ARGS")]
    pub passthrough: Vec<String>,
}

impl Args {
    /// Validate the selectors and turn the arguments into a `BuildRequest`.
    pub fn to_request(&self) -> DotResult<BuildRequest> {
        let target = match self.target.as_deref() {
            Some(target) => Selector::parse_target(target)?,
            None => Selector::default(),
        };
        let defer = self
            .defer
            .as_deref()
            .map(Selector::parse_deferral)
            .transpose()?;

        Ok(BuildRequest {
            subcommand: self.dbt_command.clone(),
            target,
            defer,
            passthrough: self.passthrough.clone(),
            no_deps: self.no_deps,
            dry_run: self.dry_run,
        })
    }
}
