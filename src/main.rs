use clap::Parser;
use dot::cli::{self, Args};
use dot::core::error::{DefaultErrorReporter, ErrorReporter};
use dot::logging;
use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let workspace = env::current_dir()
        .ok()
        .map(|cwd| logging::resolve_workspace_path(&cwd));
    let mut guard = match logging::init(workspace.as_deref()) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {:#}", err);
            None
        }
    };

    let reporter = DefaultErrorReporter::new();
    match cli::run(args, guard.as_mut()) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => {
            reporter.report_warning(&format!("dbt exited with status {}", code), None);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
        Err(err) => {
            if guard.is_some() {
                reporter.report_error(&err);
            } else {
                eprintln!("error[{}]: {}", err.code(), err);
            }
            ExitCode::FAILURE
        }
    }
}
