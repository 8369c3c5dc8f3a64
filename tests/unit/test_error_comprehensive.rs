use dot::core::error::{DefaultErrorReporter, DotError, ErrorReporter};
use dot::core::types::ErrorCategory;
use std::collections::HashSet;
use std::path::PathBuf;

fn every_error() -> Vec<DotError> {
    vec![
        DotError::InvalidRef {
            reference: "dev@".into(),
            reason: "reference after '@' is empty".into(),
        },
        DotError::RefResolution {
            reference: "nope".into(),
            reason: "unknown revision".into(),
        },
        DotError::WorktreeCreation {
            path: PathBuf::from(".dot/build/abc1234/worktree"),
            reason: "already exists".into(),
        },
        DotError::EnvironmentNotFound {
            name: Some("staging".into()),
        },
        DotError::VariableValidation {
            variable: "region".into(),
            environment: "dev".into(),
            reason: "required variable is not set".into(),
        },
        DotError::config("dot_environments.yml", "bad yaml"),
        DotError::AmbiguousNamespaceField {
            profile: "jaffle".into(),
            target: "dev".into(),
        },
        DotError::ProfileDiscovery("no profiles_dir record".into()),
        DotError::Profile {
            path: PathBuf::from("profiles.yml"),
            reason: "missing target".into(),
        },
        DotError::MissingBaseline {
            environment: "prod".into(),
            reference: "main".into(),
            path: PathBuf::from(".dot/build/abc1234/prod/target"),
            reason: "does not exist".into(),
        },
        DotError::ToolExecution {
            program: "dbt".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        },
        DotError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ),
        DotError::RepositoryNotFound {
            path: PathBuf::from("/home/analyst/scratch"),
            reason: "fatal: not a git repository".into(),
        },
    ]
}

#[test]
fn test_error_codes_are_unique() {
    let errors = every_error();
    let codes: HashSet<&str> = errors.iter().map(DotError::code).collect();
    assert_eq!(codes.len(), errors.len());
    assert!(codes.iter().all(|code| code.starts_with("DOT-")));
}

#[test]
fn test_error_categories() {
    let categories: Vec<ErrorCategory> = every_error().iter().map(DotError::category).collect();
    assert_eq!(
        categories,
        vec![
            ErrorCategory::InputError,
            ErrorCategory::VersionControlError,
            ErrorCategory::VersionControlError,
            ErrorCategory::ConfigurationError,
            ErrorCategory::ConfigurationError,
            ErrorCategory::ConfigurationError,
            ErrorCategory::ProfileError,
            ErrorCategory::ProfileError,
            ErrorCategory::ProfileError,
            ErrorCategory::BaselineError,
            ErrorCategory::ToolExecutionError,
            ErrorCategory::IoError,
            ErrorCategory::VersionControlError,
        ]
    );
}

#[test]
fn test_messages_carry_context() {
    let errors = every_error();
    assert!(errors[0].to_string().contains("dev@"));
    assert!(errors[1].to_string().contains("'nope'"));
    assert!(errors[2].to_string().contains("worktree"));
    assert!(errors[4].to_string().contains("'region'"));
    assert!(errors[4].to_string().contains("'dev'"));
    assert!(errors[6].to_string().contains("'schema' and 'dataset'"));
    assert!(errors[9].to_string().contains("'prod'"));
    assert!(errors[9].to_string().contains("'main'"));
    assert!(errors[10].to_string().contains("dbt"));
    assert!(errors[12].to_string().contains("not inside a git repository"));
    assert!(!errors[12].to_string().contains("HEAD"));
}

#[test]
fn test_recovery_suggestions() {
    let errors = every_error();
    assert!(!errors[1].recovery_suggestions().is_empty());
    assert!(errors[2].recovery_suggestions()[0].contains("git worktree prune"));
    assert!(errors[0].recovery_suggestions().is_empty());
}

#[test]
fn test_reporter_without_subscriber() {
    let reporter = DefaultErrorReporter::new();
    for error in every_error() {
        reporter.report_error(&error);
    }
    reporter.report_warning("dbt exited with 1", Some("build".into()));
    reporter.report_warning("dbt exited with 1", None);
}

#[test]
fn test_category_display() {
    assert_eq!(ErrorCategory::BaselineError.to_string(), "BaselineError");
}
