use super::VersionControl;
use crate::core::error::{DotError, DotResult};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Immutable identity of a commit: the full hash and git's shortest
/// unambiguous abbreviation of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitIdentity {
    full_hash: String,
    short_hash: String,
}

impl CommitIdentity {
    pub fn full_hash(&self) -> &str {
        &self.full_hash
    }

    pub fn short_hash(&self) -> &str {
        &self.short_hash
    }
}

impl fmt::Display for CommitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short_hash, self.full_hash)
    }
}

fn full_hash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]{40}$").expect("static regex is valid"))
}

/// Turns user-supplied references into `CommitIdentity` values.
pub struct ReferenceResolver<'a> {
    vcs: &'a dyn VersionControl,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(vcs: &'a dyn VersionControl) -> Self {
        Self { vcs }
    }

    /// Reject references that must never reach git.
    ///
    /// An empty reference would silently mean "current HEAD" and a leading `-`
    /// would be parsed as an option.
    pub fn validate(reference: &str) -> DotResult<&str> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(DotError::InvalidRef {
                reference: reference.to_string(),
                reason: "reference is empty".to_string(),
            });
        }
        if trimmed.starts_with('-') {
            return Err(DotError::InvalidRef {
                reference: reference.to_string(),
                reason: "reference must not start with '-'".to_string(),
            });
        }
        Ok(trimmed)
    }

    pub fn resolve(&self, reference: &str) -> DotResult<CommitIdentity> {
        let reference = Self::validate(reference)?;

        let full_hash = self.vcs.rev_parse_commit(reference)?;
        if !full_hash_pattern().is_match(&full_hash) {
            return Err(DotError::RefResolution {
                reference: reference.to_string(),
                reason: format!("git returned an unexpected commit id '{}'", full_hash),
            });
        }

        // Abbreviate the resolved hash rather than the reference so both
        // halves always describe the same commit.
        let short_hash = self.vcs.abbreviate(&full_hash)?;
        if short_hash.is_empty() || !full_hash.starts_with(&short_hash) {
            return Err(DotError::RefResolution {
                reference: reference.to_string(),
                reason: format!(
                    "abbreviation '{}' is not a prefix of {}",
                    short_hash, full_hash
                ),
            });
        }

        tracing::debug!(reference, %full_hash, %short_hash, "resolved git reference");
        Ok(CommitIdentity {
            full_hash,
            short_hash,
        })
    }
}
