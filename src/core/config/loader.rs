use super::{
    EnvironmentConfig, EnvironmentSection, ProjectConfig, VariableSpec, ENVIRONMENTS_FILE,
    USER_ENVIRONMENTS_FILE, VARS_FILE,
};
use crate::core::error::{DotError, DotResult};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the three configuration files from a dbt project directory.
    /// Missing or empty files contribute nothing.
    pub fn load_from_project(project_dir: &Path) -> DotResult<ProjectConfig> {
        let variables = Self::load_variables(&project_dir.join(VARS_FILE))?;
        let project = Self::load_environments(&project_dir.join(ENVIRONMENTS_FILE))?;
        let user = Self::load_environments(&project_dir.join(USER_ENVIRONMENTS_FILE))?;

        tracing::debug!(
            project_dir = %project_dir.display(),
            variables = variables.len(),
            project_environments = project.environments.len(),
            user_environments = user.environments.len(),
            "loaded dot configuration"
        );

        Ok(ProjectConfig {
            variables,
            project,
            user,
        })
    }

    /// Load `vars:` declarations from a variables file.
    pub fn load_variables(path: &Path) -> DotResult<IndexMap<String, VariableSpec>> {
        let Some(root) = Self::load_document(path)? else {
            return Ok(IndexMap::new());
        };

        let declared = match root.get("vars") {
            None | Some(Value::Null) => return Ok(IndexMap::new()),
            Some(value) => value.clone(),
        };

        let declared: IndexMap<String, Option<VariableSpec>> = serde_yaml::from_value(declared)
            .map_err(|e| DotError::config(path, format!("invalid 'vars' section: {}", e)))?;

        Ok(declared
            .into_iter()
            .map(|(name, spec)| (name, spec.unwrap_or_default()))
            .collect())
    }

    /// Load the `environment:` section of a project or user environments file.
    pub fn load_environments(path: &Path) -> DotResult<EnvironmentSection> {
        let Some(root) = Self::load_document(path)? else {
            return Ok(EnvironmentSection::default());
        };

        if root.contains_key("vars") {
            return Err(DotError::config(
                path,
                format!(
                    "root-level 'vars' is not allowed here; declare variables in {} and \
                     assign values under environment.<name>.vars",
                    VARS_FILE
                ),
            ));
        }

        let section = match root.get("environment") {
            None | Some(Value::Null) => return Ok(EnvironmentSection::default()),
            Some(Value::Mapping(section)) => section,
            Some(_) => {
                return Err(DotError::config(path, "'environment' must be a mapping"));
            }
        };

        let mut parsed = EnvironmentSection::default();
        for (key, value) in section {
            let Some(name) = key.as_str() else {
                return Err(DotError::config(
                    path,
                    format!("environment names must be strings, found {:?}", key),
                ));
            };

            match name {
                "default" => {
                    parsed.default = match value {
                        Value::Null => None,
                        Value::String(default) => Some(default.clone()),
                        other => {
                            return Err(DotError::config(
                                path,
                                format!("'environment.default' must be a string, found {:?}", other),
                            ))
                        }
                    }
                }
                "all" => parsed.all = Some(Self::parse_environment(path, name, value)?),
                _ => {
                    let environment = Self::parse_environment(path, name, value)?;
                    parsed.environments.insert(name.to_string(), environment);
                }
            }
        }

        Ok(parsed)
    }

    fn parse_environment(path: &Path, name: &str, value: &Value) -> DotResult<EnvironmentConfig> {
        if value.is_null() {
            return Ok(EnvironmentConfig::default());
        }
        serde_yaml::from_value(value.clone()).map_err(|e| {
            DotError::config(path, format!("invalid environment '{}': {}", name, e))
        })
    }

    /// Read a YAML file whose top level must be a mapping.
    /// Returns `Ok(None)` when the file is absent or has no content.
    fn load_document(path: &Path) -> DotResult<Option<Mapping>> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not present");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| DotError::io(path, e))?;
        let document: Value = serde_yaml::from_str(&content)
            .map_err(|e| DotError::config(path, format!("failed to parse YAML: {}", e)))?;

        match document {
            Value::Null => Ok(None),
            Value::Mapping(mapping) => Ok(Some(mapping)),
            _ => Err(DotError::config(path, "expected a mapping at the top level")),
        }
    }
}
