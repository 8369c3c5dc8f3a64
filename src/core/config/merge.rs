use super::{ConfigValidator, EffectiveConfig, EnvironmentConfig, ProjectConfig};
use crate::core::error::{DotError, DotResult};
use indexmap::IndexMap;
use serde_yaml::Value;

/// Resolves the effective configuration for one environment.
///
/// Layers, lowest precedence first: project `all`, project `<env>`,
/// user `all`, user `<env>`. `vars` merge key by key; every other setting
/// is replaced wholesale by the higher layer.
pub struct ConfigMerger<'a> {
    config: &'a ProjectConfig,
}

impl<'a> ConfigMerger<'a> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self { config }
    }

    /// The environment a request selects: the requested name, else the
    /// configured default. `Ok(None)` only when nothing is configured at all.
    pub fn select_environment(&self, requested: Option<&str>) -> DotResult<Option<String>> {
        let selected = requested
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or(self.config.default_environment());

        match selected {
            Some(name) if self.config.declares(name) => Ok(Some(name.to_string())),
            Some(name) => Err(DotError::EnvironmentNotFound {
                name: Some(name.to_string()),
            }),
            None if self.config.has_environments() => {
                Err(DotError::EnvironmentNotFound { name: None })
            }
            None => Ok(None),
        }
    }

    /// Select, merge and validate.
    pub fn resolve(&self, requested: Option<&str>) -> DotResult<EffectiveConfig> {
        let Some(environment) = self.select_environment(requested)? else {
            tracing::debug!("no environments configured, using an empty configuration");
            return Ok(EffectiveConfig::empty());
        };

        let effective = self.merge(&environment);
        ConfigValidator::validate(&self.config.variables, &effective)?;

        tracing::debug!(
            environment = %environment,
            args = ?effective.args().keys().collect::<Vec<_>>(),
            vars = ?effective.vars().keys().collect::<Vec<_>>(),
            "resolved environment"
        );
        Ok(effective)
    }

    /// Merge the four layers of a declared environment without validating.
    pub fn merge(&self, environment: &str) -> EffectiveConfig {
        let layers: [Option<&EnvironmentConfig>; 4] = [
            self.config.project.all.as_ref(),
            self.config.project.get(environment),
            self.config.user.all.as_ref(),
            self.config.user.get(environment),
        ];

        let mut args: IndexMap<String, Value> = IndexMap::new();
        let mut vars: IndexMap<String, Value> = IndexMap::new();
        for layer in layers.into_iter().flatten() {
            for (key, value) in &layer.settings {
                args.insert(key.clone(), value.clone());
            }
            for (key, value) in &layer.vars {
                vars.insert(key.clone(), value.clone());
            }
        }

        EffectiveConfig::new(Some(environment.to_string()), args, vars)
    }
}
