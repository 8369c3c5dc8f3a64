//! Commit-scoped dbt connection profiles.

mod discovery;

pub use discovery::parse_profiles_dir;

use crate::core::error::{DotError, DotResult};
use crate::core::tool_executor::BuildTool;
use crate::core::workspace::PROFILES_FILE;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage namespace keys; a target uses exactly one of them.
const NAMESPACE_FIELDS: [&str; 2] = ["schema", "dataset"];

/// Where an isolated profile comes from and where it goes.
#[derive(Debug, Clone)]
pub struct ProfileRequest<'a> {
    /// Project directory dbt is asked about when locating `profiles.yml`.
    pub source_project_dir: &'a Path,
    /// Project inside the worktree; its `dbt_project.yml` names the profile.
    pub isolated_project_dir: &'a Path,
    pub target: &'a str,
    pub short_hash: &'a str,
    /// The `profiles.yml` to write.
    pub destination: &'a Path,
}

pub struct ProfileGenerator<'a> {
    tool: &'a dyn BuildTool,
}

impl<'a> ProfileGenerator<'a> {
    pub fn new(tool: &'a dyn BuildTool) -> Self {
        Self { tool }
    }

    /// Locate the user's `profiles.yml` by asking dbt.
    pub fn discover_profiles_file(&self, project_dir: &Path) -> DotResult<PathBuf> {
        let report = self.tool.config_dir_report(project_dir)?;
        let dir = parse_profiles_dir(&report)?;
        let file = dir.join(PROFILES_FILE);
        if !file.is_file() {
            return Err(DotError::ProfileDiscovery(format!(
                "dbt reported {} but it contains no {}",
                dir.display(),
                PROFILES_FILE
            )));
        }
        tracing::debug!(profiles = %file.display(), "discovered dbt profiles");
        Ok(file)
    }

    /// Write the single-target, namespace-suffixed profile for an isolated build.
    pub fn generate(&self, request: &ProfileRequest<'_>) -> DotResult<PathBuf> {
        let profile_name = read_profile_name(&request.isolated_project_dir.join("dbt_project.yml"))?;
        let source = self.discover_profiles_file(request.source_project_dir)?;

        let content = fs::read_to_string(&source).map_err(|e| DotError::io(&source, e))?;
        let profiles: Value = serde_yaml::from_str(&content).map_err(|e| DotError::Profile {
            path: source.clone(),
            reason: format!("failed to parse YAML: {}", e),
        })?;

        let isolated = isolate_profile(
            &profiles,
            &source,
            &profile_name,
            request.target,
            request.short_hash,
        )?;

        let rendered = serde_yaml::to_string(&isolated).map_err(|e| DotError::Profile {
            path: request.destination.to_path_buf(),
            reason: format!("failed to serialize profile: {}", e),
        })?;
        if let Some(parent) = request.destination.parent() {
            fs::create_dir_all(parent).map_err(|e| DotError::io(parent, e))?;
        }
        fs::write(request.destination, rendered)
            .map_err(|e| DotError::io(request.destination, e))?;

        tracing::info!(
            profile = %profile_name,
            target = request.target,
            path = %request.destination.display(),
            "wrote isolated profile"
        );
        Ok(request.destination.to_path_buf())
    }
}

/// The `profile:` key of a `dbt_project.yml`.
pub fn read_profile_name(dbt_project: &Path) -> DotResult<String> {
    let content = fs::read_to_string(dbt_project).map_err(|e| DotError::io(dbt_project, e))?;
    let project: Value = serde_yaml::from_str(&content).map_err(|e| DotError::Profile {
        path: dbt_project.to_path_buf(),
        reason: format!("failed to parse YAML: {}", e),
    })?;

    match project.get("profile") {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(name.clone()),
        _ => Err(DotError::Profile {
            path: dbt_project.to_path_buf(),
            reason: "no 'profile' key naming the connection profile".to_string(),
        }),
    }
}

/// Build `{profile: {target: T, outputs: {T: ...}}}` with the target's
/// namespace field suffixed by `_<short_hash>`.
///
/// `source` only labels errors.
pub fn isolate_profile(
    profiles: &Value,
    source: &Path,
    profile_name: &str,
    target: &str,
    short_hash: &str,
) -> DotResult<Value> {
    let error = |reason: String| DotError::Profile {
        path: source.to_path_buf(),
        reason,
    };

    let profile = profiles
        .get(profile_name)
        .ok_or_else(|| error(format!("profile '{}' not found", profile_name)))?;
    let outputs = profile
        .get("outputs")
        .and_then(Value::as_mapping)
        .ok_or_else(|| error(format!("profile '{}' has no 'outputs' section", profile_name)))?;
    let mut block = outputs
        .get(target)
        .and_then(Value::as_mapping)
        .cloned()
        .ok_or_else(|| {
            error(format!(
                "target '{}' not found in outputs of profile '{}'",
                target, profile_name
            ))
        })?;

    let present: Vec<&str> = NAMESPACE_FIELDS
        .into_iter()
        .filter(|field| block.contains_key(*field))
        .collect();
    let field = match present.as_slice() {
        [field] => *field,
        [] => {
            return Err(error(format!(
                "target '{}' of profile '{}' sets neither 'schema' nor 'dataset'",
                target, profile_name
            )))
        }
        _ => {
            return Err(DotError::AmbiguousNamespaceField {
                profile: profile_name.to_string(),
                target: target.to_string(),
            })
        }
    };

    let namespace = match block.get(field) {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => {
            return Err(error(format!(
                "'{}' of target '{}' must be a non-empty string",
                field, target
            )))
        }
    };
    block.insert(
        Value::String(field.to_string()),
        Value::String(format!("{}_{}", namespace, short_hash)),
    );

    let mut outputs = Mapping::new();
    outputs.insert(Value::String(target.to_string()), Value::Mapping(block));

    let mut isolated_profile = Mapping::new();
    isolated_profile.insert("target".into(), Value::String(target.to_string()));
    isolated_profile.insert("outputs".into(), Value::Mapping(outputs));

    let mut root = Mapping::new();
    root.insert(
        Value::String(profile_name.to_string()),
        Value::Mapping(isolated_profile),
    );
    Ok(Value::Mapping(root))
}
