use dot::core::config::settings::{DBT_EXECUTABLE_ENV, GIT_EXECUTABLE_ENV};
use dot::core::config::{ConfigLoader, Settings};
use dot::core::error::DotError;
use serde_yaml::Value;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_full_project() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("dot_vars.yml"),
        "vars:\n  region:\n    description: Warehouse region\n    values: [eu, us]\n    strict: true\n  owner:\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("dot_environments.yml"),
        "environment:\n  default: dev\n  all:\n    threads: 4\n  dev:\n    target: dev\n  ci:\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_project(temp_dir.path()).unwrap();

    let region = &config.variables["region"];
    assert_eq!(region.description.as_deref(), Some("Warehouse region"));
    assert!(region.strict);
    assert!(!region.required);
    assert_eq!(
        region.values.as_deref(),
        Some(&[Value::from("eu"), Value::from("us")][..])
    );
    assert!(!config.variables["owner"].strict);

    assert_eq!(config.default_environment(), Some("dev"));
    assert!(config.declares("dev"));
    assert!(config.declares("ci"));
    assert!(!config.declares("all"));
    assert!(!config.declares("default"));
    assert_eq!(
        config.project.all.as_ref().unwrap().settings["threads"],
        Value::from(4)
    );
    assert!(config.project.get("ci").unwrap().settings.is_empty());
}

#[test]
fn test_empty_files_contribute_nothing() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("dot_vars.yml"), "").unwrap();
    fs::write(temp_dir.path().join("dot_environments.yml"), "# nothing yet\n").unwrap();
    fs::write(temp_dir.path().join("dot_environments.user.yml"), "environment:\n").unwrap();

    let config = ConfigLoader::load_from_project(temp_dir.path()).unwrap();
    assert!(config.variables.is_empty());
    assert!(!config.has_environments());
    assert_eq!(config.default_environment(), None);
}

#[test]
fn test_root_level_vars_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dot_environments.yml");
    fs::write(&path, "vars:\n  region: eu\nenvironment:\n  dev:\n").unwrap();

    let err = ConfigLoader::load_from_project(temp_dir.path()).unwrap_err();
    match err {
        DotError::Config { path: at, reason } => {
            assert_eq!(at, path);
            assert!(reason.contains("dot_vars.yml"));
        }
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn test_malformed_yaml_names_the_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("dot_environments.user.yml"),
        "environment: [unclosed\n",
    )
    .unwrap();

    let err = ConfigLoader::load_from_project(temp_dir.path()).unwrap_err();
    assert!(err.to_string().contains("dot_environments.user.yml"));
}

#[test]
fn test_non_mapping_document_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("dot_vars.yml"), "- region\n- owner\n").unwrap();

    let err = ConfigLoader::load_from_project(temp_dir.path()).unwrap_err();
    assert!(matches!(err, DotError::Config { .. }));
}

#[test]
fn test_default_must_be_a_string() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("dot_environments.yml"),
        "environment:\n  default: [dev]\n  dev:\n",
    )
    .unwrap();

    let err = ConfigLoader::load_from_project(temp_dir.path()).unwrap_err();
    assert!(err.to_string().contains("environment.default"));
}

#[test]
#[serial]
fn test_settings_from_environment() {
    env::set_var(DBT_EXECUTABLE_ENV, "/usr/local/bin/dbt");
    env::remove_var(GIT_EXECUTABLE_ENV);
    let settings = Settings::from_env();
    env::remove_var(DBT_EXECUTABLE_ENV);

    assert_eq!(settings.dbt_executable, "/usr/local/bin/dbt");
    assert_eq!(settings.git_executable, "git");
}
