//! Layered project configuration: variable declarations plus project and
//! user environment files, merged into one `EffectiveConfig` per build.

pub mod loader;
pub mod merge;
pub mod settings;
pub mod validation;

pub use loader::ConfigLoader;
pub use merge::ConfigMerger;
pub use settings::Settings;
pub use validation::ConfigValidator;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Variable declarations.
pub const VARS_FILE: &str = "dot_vars.yml";
/// Committed project environments.
pub const ENVIRONMENTS_FILE: &str = "dot_environments.yml";
/// Uncommitted per-user overrides.
pub const USER_ENVIRONMENTS_FILE: &str = "dot_environments.user.yml";

/// Declaration of one variable in `dot_vars.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allowed values; only enforced when `strict` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,

    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub required: bool,
}

/// Settings of one environment (or of the shared `all` block).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vars: IndexMap<String, Value>,

    /// Every other key (`target`, `threads`, `select`, ...), in file order.
    #[serde(flatten)]
    pub settings: IndexMap<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<IndexMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `environment:` section of one environments file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSection {
    pub default: Option<String>,
    pub all: Option<EnvironmentConfig>,
    pub environments: IndexMap<String, EnvironmentConfig>,
}

impl EnvironmentSection {
    pub fn get(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.get(name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.environments.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

/// Everything read from the three configuration files of a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfig {
    pub variables: IndexMap<String, VariableSpec>,
    pub project: EnvironmentSection,
    pub user: EnvironmentSection,
}

impl ProjectConfig {
    /// Environment used when none is requested: the user file's default wins.
    pub fn default_environment(&self) -> Option<&str> {
        self.user
            .default
            .as_deref()
            .or(self.project.default.as_deref())
    }

    pub fn declares(&self, name: &str) -> bool {
        self.project.declares(name) || self.user.declares(name)
    }

    pub fn has_environments(&self) -> bool {
        !self.project.is_empty() || !self.user.is_empty()
    }
}

/// Merged settings for the environment a build runs in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveConfig {
    environment: Option<String>,
    args: IndexMap<String, Value>,
    vars: IndexMap<String, Value>,
}

impl EffectiveConfig {
    pub fn new(
        environment: Option<String>,
        args: IndexMap<String, Value>,
        vars: IndexMap<String, Value>,
    ) -> Self {
        Self {
            environment,
            args,
            vars,
        }
    }

    /// No environment at all: dbt runs with its own defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn args(&self) -> &IndexMap<String, Value> {
        &self.args
    }

    pub fn vars(&self) -> &IndexMap<String, Value> {
        &self.vars
    }

    /// The dbt target: an explicit `target` setting, else the environment name.
    pub fn target(&self) -> Option<String> {
        match self.args.get("target") {
            Some(Value::String(target)) if !target.is_empty() => Some(target.clone()),
            _ => self.environment.clone(),
        }
    }
}
