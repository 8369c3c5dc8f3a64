//! `<environment>[@<ref>]` selectors from the command line.

use crate::core::error::{DotError, DotResult};

/// An environment name and/or git reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub environment: Option<String>,
    pub reference: Option<String>,
}

impl Selector {
    /// The build target: `env`, `env@ref`, `@ref`, or nothing at all.
    pub fn parse_target(input: &str) -> DotResult<Self> {
        match split_once_at(input)? {
            None => Ok(Self {
                environment: non_blank(input),
                reference: None,
            }),
            Some((environment, reference)) => Ok(Self {
                environment: non_blank(environment),
                reference: Some(require_reference(input, reference)?),
            }),
        }
    }

    /// A deferral baseline: `env@ref` or `@ref`. The reference is mandatory.
    pub fn parse_deferral(input: &str) -> DotResult<Self> {
        match split_once_at(input)? {
            None => Err(DotError::InvalidRef {
                reference: input.to_string(),
                reason: "deferral needs a git reference: use <environment>@<ref> or @<ref>"
                    .to_string(),
            }),
            Some((environment, reference)) => Ok(Self {
                environment: non_blank(environment),
                reference: Some(require_reference(input, reference)?),
            }),
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.reference.is_some()
    }
}

fn split_once_at(input: &str) -> DotResult<Option<(&str, &str)>> {
    if input.matches('@').count() > 1 {
        return Err(DotError::InvalidRef {
            reference: input.to_string(),
            reason: "expected at most one '@' separating environment and reference".to_string(),
        });
    }
    Ok(input.split_once('@'))
}

fn require_reference(input: &str, reference: &str) -> DotResult<String> {
    non_blank(reference).ok_or_else(|| DotError::InvalidRef {
        reference: input.to_string(),
        reason: "reference after '@' is empty".to_string(),
    })
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
