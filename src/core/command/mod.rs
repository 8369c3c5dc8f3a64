//! Assembly of dbt command lines.

pub mod flags;

use crate::core::config::EffectiveConfig;
use crate::core::error::{DotError, DotResult};
use serde_yaml::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// One `--name [values...]` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    name: String,
    values: Vec<String>,
}

impl Flag {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn push_args(&self, args: &mut Vec<String>) {
        args.push(format!("--{}", self.name));
        args.extend(self.values.iter().cloned());
    }
}

/// A fully assembled dbt invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    program: String,
    subcommand: String,
    flags: Vec<Flag>,
    passthrough: Vec<String>,
}

impl BuildCommand {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn subcommand(&self) -> &str {
        &self.subcommand
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|flag| flag.name == name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flag(name).is_some()
    }

    /// Arguments after the program name, in order.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.subcommand.clone()];
        for flag in &self.flags {
            flag.push_args(&mut args);
        }
        args.extend(self.passthrough.iter().cloned());
        args
    }
}

impl fmt::Display for BuildCommand {
    /// Shell-quoted form, for logs and `--dry-run`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in self.args() {
            write!(f, " {}", shell_quote(&arg))?;
        }
        Ok(())
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+,%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Paths and target of an isolated build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedPaths {
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub target_path: PathBuf,
    pub log_path: PathBuf,
    pub target: String,
}

/// Builds a `BuildCommand` in a fixed order: configuration, isolation,
/// deferral, then the per-sub-command flag filter.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    subcommand: String,
    flags: Vec<Flag>,
    passthrough: Vec<String>,
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>, subcommand: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            subcommand: subcommand.into(),
            flags: Vec::new(),
            passthrough: Vec::new(),
        }
    }

    /// `--vars` from the merged variables, then one flag per setting.
    pub fn with_config(mut self, config: &EffectiveConfig) -> DotResult<Self> {
        if !config.vars().is_empty() {
            let mut vars = serde_json::Map::new();
            for (name, value) in config.vars() {
                let json = serde_json::to_value(value).map_err(|e| DotError::VariableValidation {
                    variable: name.clone(),
                    environment: config.environment().unwrap_or_default().to_string(),
                    reason: format!("value cannot be passed to dbt as JSON: {}", e),
                })?;
                vars.insert(name.clone(), json);
            }
            self.set(Flag::with_value(
                "vars",
                serde_json::Value::Object(vars).to_string(),
            ));
        }

        for (key, value) in config.args() {
            if let Some(flag) = setting_flag(key, value) {
                self.set(flag);
            }
        }
        Ok(self)
    }

    /// Point dbt at the isolated checkout, profile and output directories.
    pub fn with_isolation(mut self, paths: &IsolatedPaths) -> Self {
        self.set(Flag::with_value("project-dir", path_arg(&paths.project_dir)));
        self.set(Flag::with_value("profiles-dir", path_arg(&paths.profiles_dir)));
        self.set(Flag::with_value("target-path", path_arg(&paths.target_path)));
        self.set(Flag::with_value("log-path", path_arg(&paths.log_path)));
        self.set(Flag::with_value("target", paths.target.clone()));
        self
    }

    /// Defer unselected nodes to the baseline artifacts in `state`.
    pub fn with_deferral(mut self, state: &Path) -> Self {
        self.set(Flag::bare("defer"));
        self.set(Flag::bare("favor-state"));
        self.set(Flag::with_value("state", path_arg(state)));
        self
    }

    /// Arguments appended verbatim after filtering.
    pub fn with_passthrough(mut self, args: &[String]) -> Self {
        self.passthrough.extend(args.iter().cloned());
        self
    }

    pub fn build(self) -> BuildCommand {
        let subcommand = self.subcommand;
        if !flags::is_known(&subcommand) {
            tracing::debug!(subcommand = %subcommand, "unknown sub-command, passing global flags only");
        }
        let (kept, dropped): (Vec<Flag>, Vec<Flag>) = self
            .flags
            .into_iter()
            .partition(|flag| flags::accepts(&subcommand, &flag.name));

        if !dropped.is_empty() {
            tracing::debug!(
                subcommand = %subcommand,
                dropped = ?dropped.iter().map(Flag::name).collect::<Vec<_>>(),
                "dropping flags the sub-command does not accept"
            );
        }

        BuildCommand {
            program: self.program,
            subcommand,
            flags: kept,
            passthrough: self.passthrough,
        }
    }

    /// Replace a flag of the same name in place, or append it.
    fn set(&mut self, flag: Flag) {
        match self.flags.iter_mut().find(|existing| existing.name == flag.name) {
            Some(existing) => *existing = flag,
            None => self.flags.push(flag),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Render one environment setting: `true` is a bare flag, `false`, null and
/// empty values are omitted, sequences repeat their values after one flag.
fn setting_flag(key: &str, value: &Value) -> Option<Flag> {
    let name = key.replace('_', "-");
    match value {
        Value::Bool(true) => Some(Flag::bare(name)),
        Value::Bool(false) | Value::Null => None,
        Value::Sequence(items) => {
            let values: Vec<String> = items.iter().filter_map(scalar_arg).collect();
            (!values.is_empty()).then(|| Flag { name, values })
        }
        other => scalar_arg(other).map(|v| Flag::with_value(name, v)),
    }
}

fn scalar_arg(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_arg(&tagged.value),
        // Structured settings such as run-operation `args` go over as JSON.
        mapping @ Value::Mapping(_) => serde_json::to_string(mapping).ok(),
        sequence @ Value::Sequence(_) => serde_json::to_string(sequence).ok(),
    }
}
