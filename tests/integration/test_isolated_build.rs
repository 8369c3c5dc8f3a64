#[path = "../common/mod.rs"]
mod common;

use common::{FakeDbt, FakeGit, Fixture, MAIN_HASH};
use dot::core::error::DotError;
use dot::core::orchestrator::{BuildOrchestrator, BuildRequest};
use dot::core::selector::Selector;
use std::fs;

const ENVIRONMENTS: &str = "\
environment:
  default: dev
  all:
    threads: 4
  dev:
    target: dev
    vars:
      region: eu
  prod:
    target: prod
";

fn request(subcommand: &str, target: &str) -> BuildRequest {
    BuildRequest {
        subcommand: subcommand.to_string(),
        target: Selector::parse_target(target).unwrap(),
        ..Default::default()
    }
}

fn fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.write("dot_environments.yml", ENVIRONMENTS);
    fixture
}

#[test]
fn test_isolated_build_layout() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let plan = orchestrator.plan(&request("build", "dev@main")).unwrap();

    let build_dir = fixture.build_dir("abc1234");
    let isolated = plan.isolated.as_ref().unwrap();
    assert_eq!(isolated.root(), build_dir);
    assert_eq!(plan.environment.as_deref(), Some("dev"));
    assert_eq!(plan.working_dir, build_dir.join("worktree"));
    assert!(build_dir.join("worktree").join("dbt_project.yml").is_file());
    assert_eq!(
        fs::read_to_string(build_dir.join("commit")).unwrap(),
        format!("{}\n", MAIN_HASH)
    );
    assert!(build_dir.join("dev").join("profiles.yml").is_file());
}

#[test]
fn test_isolated_build_commands() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let plan = orchestrator.plan(&request("build", "dev@main")).unwrap();

    let build_dir = fixture.build_dir("abc1234");
    let worktree = build_dir.join("worktree").display().to_string();
    let env_dir = build_dir.join("dev").display().to_string();
    let target_path = build_dir.join("dev").join("target").display().to_string();
    let log_path = build_dir.join("dev").join("logs").display().to_string();

    assert_eq!(plan.commands.len(), 2);
    assert_eq!(
        plan.commands[0].args(),
        vec![
            "deps".to_string(),
            "--vars".to_string(),
            r#"{"region":"eu"}"#.to_string(),
            "--target".to_string(),
            "dev".to_string(),
            "--project-dir".to_string(),
            worktree.clone(),
            "--profiles-dir".to_string(),
            env_dir.clone(),
        ]
    );
    assert_eq!(
        plan.commands[1].args(),
        vec![
            "build".to_string(),
            "--vars".to_string(),
            r#"{"region":"eu"}"#.to_string(),
            "--threads".to_string(),
            "4".to_string(),
            "--target".to_string(),
            "dev".to_string(),
            "--project-dir".to_string(),
            worktree,
            "--profiles-dir".to_string(),
            env_dir,
            "--target-path".to_string(),
            target_path,
            "--log-path".to_string(),
            log_path,
        ]
    );
}

#[test]
fn test_isolated_profile_is_suffixed() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    orchestrator.plan(&request("run", "prod@main")).unwrap();

    let written = fs::read_to_string(fixture.build_dir("abc1234").join("prod").join("profiles.yml")).unwrap();
    let profile: serde_yaml::Value = serde_yaml::from_str(&written).unwrap();
    assert_eq!(profile["jaffle"]["target"], serde_yaml::Value::from("prod"));
    assert_eq!(
        profile["jaffle"]["outputs"]["prod"]["schema"],
        serde_yaml::Value::from("analytics_abc1234")
    );
    assert_eq!(
        profile["jaffle"]["outputs"]["prod"]["host"],
        serde_yaml::Value::from("warehouse")
    );
    assert!(profile["jaffle"]["outputs"].get("dev").is_none());
}

#[test]
fn test_second_build_reuses_worktree() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    orchestrator.plan(&request("build", "dev@main")).unwrap();
    let commit_file = fixture.build_dir("abc1234").join("commit");
    let first_modified = fs::metadata(&commit_file).unwrap().modified().unwrap();

    orchestrator.plan(&request("build", "prod@main")).unwrap();

    assert_eq!(git.calls_matching("worktree add"), 1);
    assert_eq!(
        fs::metadata(&commit_file).unwrap().modified().unwrap(),
        first_modified
    );
    assert!(fixture.build_dir("abc1234").join("dev").join("profiles.yml").is_file());
    assert!(fixture.build_dir("abc1234").join("prod").join("profiles.yml").is_file());
}

#[test]
fn test_corrupt_worktree_is_recreated() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    orchestrator.plan(&request("build", "dev@main")).unwrap();
    let worktree = fixture.build_dir("abc1234").join("worktree");
    fs::remove_file(worktree.join(".git")).unwrap();

    orchestrator.plan(&request("build", "dev@main")).unwrap();

    assert_eq!(git.calls_matching("worktree add"), 2);
    assert!(git.calls_matching("worktree prune") >= 2);
    assert!(worktree.join(".git").is_file());
}

#[test]
fn test_inconsistent_commit_file_is_rewritten() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    orchestrator.plan(&request("build", "dev@main")).unwrap();
    let commit_file = fixture.build_dir("abc1234").join("commit");
    fs::write(&commit_file, "garbage\n").unwrap();

    orchestrator.plan(&request("build", "dev@main")).unwrap();
    assert_eq!(
        fs::read_to_string(&commit_file).unwrap(),
        format!("{}\n", MAIN_HASH)
    );
}

#[test]
fn test_deps_suppression() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let mut no_deps = request("build", "dev@main");
    no_deps.no_deps = true;
    assert_eq!(orchestrator.plan(&no_deps).unwrap().commands.len(), 1);

    let mut dry_run = request("build", "dev@main");
    dry_run.dry_run = true;
    assert_eq!(orchestrator.plan(&dry_run).unwrap().commands.len(), 1);

    let deps = orchestrator.plan(&request("deps", "dev@main")).unwrap();
    assert_eq!(deps.commands.len(), 1);
    assert_eq!(deps.commands[0].subcommand(), "deps");

    let in_place = orchestrator.plan(&request("build", "dev")).unwrap();
    assert_eq!(in_place.commands.len(), 1);
}

#[test]
fn test_in_place_build_touches_nothing() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let plan = orchestrator.plan(&request("run", "")).unwrap();

    assert_eq!(plan.working_dir, fixture.repo);
    assert!(plan.isolated.is_none());
    assert_eq!(
        plan.commands[0].to_string(),
        r#"dbt run --vars '{"region":"eu"}' --threads 4 --target dev"#
    );
    assert!(git.calls.borrow().is_empty());
    assert_eq!(dbt.reports.get(), 0);
    assert!(!fixture.repo.join(".dot").exists());
}

#[test]
fn test_unknown_environment_creates_nothing() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let err = orchestrator.plan(&request("build", "staging@main")).unwrap_err();

    assert!(matches!(err, DotError::EnvironmentNotFound { name: Some(ref n) } if n == "staging"));
    assert!(!fixture.repo.join(".dot").exists());
    assert!(git.calls.borrow().is_empty());
}

#[test]
fn test_unknown_reference() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let err = orchestrator.plan(&request("build", "dev@nope")).unwrap_err();
    assert!(matches!(err, DotError::RefResolution { ref reference, .. } if reference == "nope"));
    assert!(!fixture.build_dir("abc1234").exists());
}

#[test]
fn test_ambiguous_namespace_writes_no_profile() {
    let fixture = fixture();
    fs::write(
        fixture.profiles_dir.join("profiles.yml"),
        "jaffle:\n  outputs:\n    dev:\n      type: bigquery\n      schema: a\n      dataset: b\n",
    )
    .unwrap();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let err = orchestrator.plan(&request("build", "dev@main")).unwrap_err();

    assert!(matches!(err, DotError::AmbiguousNamespaceField { .. }));
    assert!(!fixture.build_dir("abc1234").join("dev").join("profiles.yml").exists());
}

#[test]
fn test_missing_required_variable_fails_before_checkout() {
    let fixture = fixture();
    fixture.write("dot_vars.yml", "vars:\n  owner:\n    required: true\n");
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let err = orchestrator.plan(&request("build", "dev@main")).unwrap_err();

    assert!(matches!(err, DotError::VariableValidation { ref variable, .. } if variable == "owner"));
    assert!(!fixture.repo.join(".dot").exists());
}

#[test]
fn test_execute_stops_at_first_failure() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir).with_exit_codes(&[2]);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let plan = orchestrator.plan(&request("build", "dev@main")).unwrap();
    assert_eq!(orchestrator.execute(&plan).unwrap(), 2);
    assert_eq!(dbt.subcommands(), vec!["deps".to_string()]);
}

#[test]
fn test_execute_runs_deps_then_primary_in_worktree() {
    let fixture = fixture();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let plan = orchestrator.plan(&request("test", "dev@main")).unwrap();
    assert_eq!(orchestrator.execute(&plan).unwrap(), 0);

    assert_eq!(dbt.subcommands(), vec!["deps".to_string(), "test".to_string()]);
    for (_, cwd) in dbt.executed.borrow().iter() {
        assert_eq!(cwd, &fixture.build_dir("abc1234").join("worktree"));
    }
}

#[test]
fn test_isolated_build_needs_an_environment() {
    let fixture = Fixture::new();
    let git = FakeGit::new(&fixture.repo);
    let dbt = FakeDbt::new(&fixture.profiles_dir);
    let orchestrator = BuildOrchestrator::new(&fixture.repo, &git, &dbt);

    let err = orchestrator.plan(&request("build", "@main")).unwrap_err();
    assert!(matches!(err, DotError::EnvironmentNotFound { name: None }));
}
