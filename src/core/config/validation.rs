use super::{EffectiveConfig, VariableSpec};
use crate::core::error::{DotError, DotResult};
use indexmap::IndexMap;
use serde_yaml::Value;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Check the merged vars against their declarations.
    ///
    /// Undeclared variables pass through untouched.
    pub fn validate(
        specs: &IndexMap<String, VariableSpec>,
        config: &EffectiveConfig,
    ) -> DotResult<()> {
        let environment = config.environment().unwrap_or_default();

        for (name, spec) in specs {
            // A null value counts as unset for both checks.
            let value = config.vars().get(name).filter(|value| !value.is_null());

            if spec.required && value.is_none() {
                return Err(DotError::VariableValidation {
                    variable: name.clone(),
                    environment: environment.to_string(),
                    reason: "required variable is not set".to_string(),
                });
            }

            if let (true, Some(allowed), Some(value)) = (spec.strict, &spec.values, value) {
                if !allowed.contains(value) {
                    return Err(DotError::VariableValidation {
                        variable: name.clone(),
                        environment: environment.to_string(),
                        reason: format!(
                            "value {} is not one of [{}]",
                            render(value),
                            allowed.iter().map(render).collect::<Vec<_>>().join(", ")
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}
