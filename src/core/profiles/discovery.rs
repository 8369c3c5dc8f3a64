//! Reading the profiles directory out of dbt's JSON log lines.

use crate::core::error::{DotError, DotResult};
use serde_json::Value;
use std::path::PathBuf;

/// Extract `data.profiles_dir` from line-delimited JSON log output.
///
/// Lines that are not JSON objects, and records without the field, are skipped.
/// The same directory may be reported more than once; two different ones are
/// an error.
pub fn parse_profiles_dir(output: &str) -> DotResult<PathBuf> {
    let mut found: Option<String> = None;

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Ok(Value::Object(record)) = serde_json::from_str::<Value>(line) else {
            continue;
        };

        let Some(dir) = record
            .get("data")
            .and_then(|data| data.get("profiles_dir"))
            .and_then(Value::as_str)
        else {
            continue;
        };

        match &found {
            Some(existing) if existing != dir => {
                return Err(DotError::ProfileDiscovery(format!(
                    "dbt reported conflicting profiles directories '{}' and '{}'",
                    existing, dir
                )));
            }
            Some(_) => {}
            None => found = Some(dir.to_string()),
        }
    }

    found.map(PathBuf::from).ok_or_else(|| {
        DotError::ProfileDiscovery("dbt output did not include a profiles_dir record".to_string())
    })
}
