use clap::Parser;
use dot::cli::Args;
use dot::core::error::DotError;

fn parse(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("dot").chain(argv.iter().copied())).unwrap()
}

#[test]
fn test_subcommand_only() {
    let args = parse(&["run"]);
    assert_eq!(args.dbt_command, "run");
    assert_eq!(args.target, None);

    let request = args.to_request().unwrap();
    assert_eq!(request.subcommand, "run");
    assert!(!request.target.is_isolated());
    assert!(request.defer.is_none());
}

#[test]
fn test_isolated_target() {
    let request = parse(&["build", "dev@main"]).to_request().unwrap();
    assert_eq!(request.target.environment.as_deref(), Some("dev"));
    assert_eq!(request.target.reference.as_deref(), Some("main"));
    assert!(request.wants_deps());
}

#[test]
fn test_flags_and_passthrough() {
    let args = parse(&[
        "--dry-run",
        "--no-deps",
        "--defer",
        "prod@v1.0.0",
        "test",
        "@HEAD",
        "--",
        "--select",
        "orders",
    ]);
    assert!(args.dry_run);
    assert!(args.no_deps);
    assert_eq!(args.passthrough, vec!["--select", "orders"]);

    let request = args.to_request().unwrap();
    assert_eq!(request.target.environment, None);
    assert_eq!(request.target.reference.as_deref(), Some("HEAD"));
    let defer = request.defer.unwrap();
    assert_eq!(defer.environment.as_deref(), Some("prod"));
    assert_eq!(defer.reference.as_deref(), Some("v1.0.0"));
}

#[test]
fn test_flags_after_positionals() {
    let args = parse(&["run", "dev", "--defer", "@main"]);
    assert_eq!(args.target.as_deref(), Some("dev"));
    assert_eq!(args.defer.as_deref(), Some("@main"));
}

#[test]
fn test_invalid_selectors() {
    for target in ["dev@", "dev@a@b", "@"] {
        let err = parse(&["build", target]).to_request().unwrap_err();
        assert!(matches!(err, DotError::InvalidRef { .. }), "{target}");
    }
    let err = parse(&["build", "--defer", "prod", "dev"]).to_request().unwrap_err();
    assert!(matches!(err, DotError::InvalidRef { .. }));
}

#[test]
fn test_missing_subcommand_is_rejected() {
    assert!(Args::try_parse_from(["dot"]).is_err());
}
