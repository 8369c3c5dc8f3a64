pub mod args;
pub mod commands;

pub use args::Args;

use crate::core::error::DotResult;
use crate::logging::LoggingGuard;

pub(crate) const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nARGUMENTS:\n{positionals}\n\
\nOPTIONS:\n{options}\n\
{after-help}";

pub(crate) const AFTER_HELP: &str = "\
EXAMPLES:
    dot run                          run with the default environment in place
    dot build dev                    build the dev environment in place
    dot build dev@main               build dev against an isolated checkout of main
    dot test prod@v1.4.0 -- -s my_model
    dot build dev@HEAD --defer prod@main

Isolated builds live in .dot/build/<short-hash>/ at the repository root.
Environments come from dot_environments.yml and dot_environments.user.yml,
variable declarations from dot_vars.yml.";

/// Parse selectors, plan the build and run it; returns the process exit code.
///
/// The log file is opened through `logging` once the build has been planned.
pub fn run(args: Args, logging: Option<&mut LoggingGuard>) -> DotResult<i32> {
    commands::build(args, logging)
}
